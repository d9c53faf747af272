use crate::locator::Locator;

/// Opaque reference to one element of the rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Matches for a [`Locator`] in document order.
#[derive(Debug, Clone)]
pub struct ElementSet {
    locator: Locator,
    elements: Vec<ElementHandle>,
}

impl ElementSet {
    #[must_use]
    pub fn new(locator: Locator, elements: Vec<ElementHandle>) -> Self {
        Self { locator, elements }
    }

    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&ElementHandle> {
        self.elements.first()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ElementHandle> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementHandle> {
        self.elements.iter()
    }
}
