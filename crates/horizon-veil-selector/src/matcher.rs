//! Selector matching algorithm.

use super::{AttributeSelector, Combinator, PseudoClass, Selector, SelectorList, SelectorPart, TypeSelector};

/// Sibling position information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiblingInfo {
    /// Zero-based index among siblings.
    pub index: usize,
    /// Total number of siblings (including self).
    pub count: usize,
}

impl SiblingInfo {
    /// Returns true if this is the first sibling.
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Returns true if this is the last sibling.
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.count
    }

    /// Returns true if this is the only child.
    pub fn is_only(&self) -> bool {
        self.count == 1
    }
}

/// Tree access needed to match selectors against elements.
///
/// Implemented by document types; the matcher never mutates the tree.
pub trait ElementTree {
    /// Element handle type.
    type Element: Copy + Eq;

    /// The element's local (tag) name, lowercase.
    fn local_name(&self, element: Self::Element) -> &str;

    /// Value of an attribute, if present.
    fn attribute(&self, element: Self::Element, name: &str) -> Option<&str>;

    /// The parent element, if any.
    fn parent_element(&self, element: Self::Element) -> Option<Self::Element>;

    /// The immediately preceding sibling, if any.
    fn previous_sibling_element(&self, element: Self::Element) -> Option<Self::Element>;

    /// Position among the parent's children, `None` for parentless elements.
    fn sibling_info(&self, element: Self::Element) -> Option<SiblingInfo>;

    /// Number of children.
    fn child_count(&self, element: Self::Element) -> usize;

    /// The element's ID (the `id` attribute).
    fn id(&self, element: Self::Element) -> Option<&str> {
        self.attribute(element, "id")
    }

    /// Check the whitespace-separated `class` attribute for a class name.
    fn has_class(&self, element: Self::Element, class: &str) -> bool {
        self.attribute(element, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

/// Selector matching engine.
pub struct SelectorMatcher;

impl SelectorMatcher {
    /// Check if any selector in the list matches the element.
    pub fn matches_list<T: ElementTree>(list: &SelectorList, tree: &T, element: T::Element) -> bool {
        list.iter().any(|selector| Self::matches(selector, tree, element))
    }

    /// Check if a full selector matches the element, considering combinators.
    ///
    /// This walks the selector from right to left, backtracking through
    /// ancestors and siblings where a combinator allows several candidates.
    pub fn matches<T: ElementTree>(selector: &Selector, tree: &T, element: T::Element) -> bool {
        if selector.parts.is_empty() {
            return false;
        }
        Self::matches_from(selector, selector.parts.len() - 1, tree, element)
    }

    fn matches_from<T: ElementTree>(
        selector: &Selector,
        index: usize,
        tree: &T,
        element: T::Element,
    ) -> bool {
        if !Self::part_matches(&selector.parts[index], tree, element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let next = index - 1;
        match selector.combinators[next] {
            Combinator::Descendant => {
                let mut current = tree.parent_element(element);
                while let Some(ancestor) = current {
                    if Self::matches_from(selector, next, tree, ancestor) {
                        return true;
                    }
                    current = tree.parent_element(ancestor);
                }
                false
            }

            Combinator::Child => tree
                .parent_element(element)
                .is_some_and(|parent| Self::matches_from(selector, next, tree, parent)),

            Combinator::AdjacentSibling => tree
                .previous_sibling_element(element)
                .is_some_and(|sibling| Self::matches_from(selector, next, tree, sibling)),

            Combinator::GeneralSibling => {
                let mut current = tree.previous_sibling_element(element);
                while let Some(sibling) = current {
                    if Self::matches_from(selector, next, tree, sibling) {
                        return true;
                    }
                    current = tree.previous_sibling_element(sibling);
                }
                false
            }
        }
    }

    /// Check if a compound selector part matches the element.
    pub fn part_matches<T: ElementTree>(part: &SelectorPart, tree: &T, element: T::Element) -> bool {
        if let Some(TypeSelector::Type(name)) = &part.type_selector {
            if !tree.local_name(element).eq_ignore_ascii_case(name) {
                return false;
            }
        }

        if let Some(id) = &part.id {
            if tree.id(element) != Some(id.as_str()) {
                return false;
            }
        }

        if !part.classes.iter().all(|class| tree.has_class(element, class)) {
            return false;
        }

        for attribute in &part.attributes {
            let matched = match attribute {
                AttributeSelector::Exists(name) => tree.attribute(element, name).is_some(),
                AttributeSelector::Equals(name, value) => {
                    tree.attribute(element, name) == Some(value.as_str())
                }
            };
            if !matched {
                return false;
            }
        }

        part.pseudo_classes
            .iter()
            .all(|pseudo| Self::pseudo_matches(pseudo, tree, element))
    }

    fn pseudo_matches<T: ElementTree>(pseudo: &PseudoClass, tree: &T, element: T::Element) -> bool {
        match pseudo {
            PseudoClass::FirstChild => tree.sibling_info(element).is_some_and(|s| s.is_first()),
            PseudoClass::LastChild => tree.sibling_info(element).is_some_and(|s| s.is_last()),
            PseudoClass::OnlyChild => tree.sibling_info(element).is_some_and(|s| s.is_only()),
            PseudoClass::NthChild(expr) => tree
                .sibling_info(element)
                .is_some_and(|s| expr.matches(s.index)),
            PseudoClass::Empty => tree.child_count(element) == 0,
            PseudoClass::Not(inner) => !Self::part_matches(inner, tree, element),
        }
    }
}
