//! Model descriptors: the outer axis of the fallback matrix.

use std::time::Duration;

/// Placeholder substituted with the model name in an endpoint template.
pub const MODEL_PLACEHOLDER: &str = "{model}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub name: String,
    pub endpoint_template: String,
    /// Ascending: lower values are tried first.
    pub priority: u32,
    pub timeout: Duration,
    pub description: String,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, endpoint_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint_template: endpoint_template.into(),
            priority: 0,
            timeout: Duration::from_secs(30),
            description: String::new(),
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn endpoint(&self) -> String {
        self.endpoint_template.replace(MODEL_PLACEHOLDER, &self.name)
    }
}

/// Stable sort by ascending priority; ties keep configuration order.
pub fn by_priority(mut models: Vec<ModelDescriptor>) -> Vec<ModelDescriptor> {
    models.sort_by_key(|m| m.priority);
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent";

    #[test]
    fn test_endpoint_substitutes_model_name() {
        let m = ModelDescriptor::new("gemini-2.0-flash", TEMPLATE);
        assert_eq!(
            m.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_priority_order_is_stable() {
        let models = by_priority(vec![
            ModelDescriptor::new("c", TEMPLATE).with_priority(3),
            ModelDescriptor::new("a1", TEMPLATE).with_priority(1),
            ModelDescriptor::new("b", TEMPLATE).with_priority(2),
            ModelDescriptor::new("a2", TEMPLATE).with_priority(1),
        ]);
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a1", "a2", "b", "c"]);
    }
}
