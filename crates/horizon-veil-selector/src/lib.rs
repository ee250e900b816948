//! CSS selector engine for Horizon Veil.
//!
//! This crate parses selector lists such as `"#target, .dialog > Button"` and
//! matches them against any element tree that implements [`ElementTree`].
//!
//! - **Selectors**: Type, universal, ID, class, attribute and structural
//!   pseudo-class selectors
//! - **Combinators**: Descendant, child, adjacent sibling and general sibling
//! - **Selector lists**: Comma-separated alternatives
//!
//! # Example
//!
//! ```
//! use horizon_veil_selector::SelectorList;
//!
//! let list = SelectorList::parse("#target, #target-2").unwrap();
//! assert_eq!(list.len(), 2);
//! assert_eq!(list.to_string(), "#target, #target-2");
//! ```

mod error;
mod matcher;
mod parser;
mod types;

pub use error::{Result, SelectorError};
pub use matcher::{ElementTree, SelectorMatcher, SiblingInfo};
pub use parser::parse_selector_list;
pub use types::{
    AttributeSelector, Combinator, NthExpr, PseudoClass, Selector, SelectorList, SelectorPart,
    TypeSelector,
};
