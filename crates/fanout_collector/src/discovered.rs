/// One module as reported by the test framework's discovery, before
/// indices are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModule {
    pub name: String,

    /// The module carries the sequential marker.
    pub sequential: bool,

    pub classes: Vec<DiscoveredClass>,

    /// Set when the module could not be imported.
    pub error: Option<String>,
}

impl DiscoveredModule {
    pub fn loaded(
        name: impl Into<String>,
        sequential: bool,
        classes: Vec<DiscoveredClass>,
    ) -> Self {
        Self {
            name: name.into(),
            sequential,
            classes,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequential: false,
            classes: Vec::new(),
            error: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredClass {
    pub name: String,
    pub sequential: bool,

    /// Requested attributes the class sets to a truthy value.
    pub attributes: Vec<String>,

    pub methods: Vec<DiscoveredMethod>,
}

impl DiscoveredClass {
    pub fn new<M: Into<DiscoveredMethod>>(
        name: impl Into<String>,
        sequential: bool,
        methods: impl IntoIterator<Item = M>,
    ) -> Self {
        Self {
            name: name.into(),
            sequential,
            attributes: Vec::new(),
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn with_attributes<S: Into<String>>(
        mut self,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMethod {
    pub name: String,

    /// Requested attributes the method sets to a truthy value.
    pub attributes: Vec<String>,
}

impl DiscoveredMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attributes<S: Into<String>>(
        mut self,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&str> for DiscoveredMethod {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DiscoveredMethod {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
