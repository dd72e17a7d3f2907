use std::sync::Arc;

use crate::error::{ClipsightError, Result};

use super::builtin::builtin_handlers;
use super::manifest::ToolDeclaration;
use super::tool::{ToolHandler, ToolKind};

#[derive(Clone)]
struct ToolEntry {
    declaration: ToolDeclaration,
    handler: Arc<dyn ToolHandler>,
}

/// 一次请求可用的工具集合，按声明顺序保存
///
/// 声明与处理器一一对应；同名重复声明直接报错。
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn declare<I>(handlers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn ToolHandler>>,
    {
        let mut registry = Self::new();
        for handler in handlers {
            registry.register(handler)?;
        }
        Ok(registry)
    }

    pub fn builtin() -> Result<Self> {
        Self::declare(builtin_handlers())
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let kind = handler.kind();
        if self.contains(kind) {
            return Err(ClipsightError::DuplicateTool(kind.name().to_string()));
        }
        self.tools.push(ToolEntry {
            declaration: ToolDeclaration::for_kind(kind),
            handler,
        });
        Ok(())
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.tools.iter().any(|entry| entry.handler.kind() == kind)
    }

    pub fn handler(&self, kind: ToolKind) -> Option<Arc<dyn ToolHandler>> {
        self.tools
            .iter()
            .find(|entry| entry.handler.kind() == kind)
            .map(|entry| Arc::clone(&entry.handler))
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools
            .iter()
            .map(|entry| entry.declaration.clone())
            .collect()
    }

    pub fn kinds(&self) -> Vec<ToolKind> {
        self.tools.iter().map(|entry| entry.handler.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
