use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CapabilityError;

/// One executable capability the orchestrator can dispatch to by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, args: Value) -> Result<String, CapabilityError>;
}

/// Startup-time registration table mapping tool name to implementation.
/// There is no runtime discovery; everything the orchestrator may call is
/// registered here before construction.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::{Tool, ToolRegistry};
    use crate::error::CapabilityError;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn execute(&self, args: Value) -> Result<String, CapabilityError> {
            Ok(args.to_string())
        }
    }

    #[tokio::test]
    async fn registered_tools_are_found_by_name() {
        let mut registry = ToolRegistry::default();
        registry.register(EchoTool);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["echo"]);

        let tool = registry.get("echo").expect("echo registered");
        let result = tool.execute(json!({"k": "v"})).await.expect("execute");
        assert!(result.contains("\"k\""));
    }

    #[test]
    fn missing_tools_return_none() {
        let registry = ToolRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get("get_weather").is_none());
    }
}
