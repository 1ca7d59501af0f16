//! Demo Scene
//!
//! A deliberately small scene model (named objects with a kind and a
//! position) used by `dev-mcp` to exercise the command surface end to end:
//! object commands, checkpoints over the scene, batches and image results.

use async_trait::async_trait;
use scenelink_core::checkpoint::{CheckpointConfig, CheckpointManager, SystemMemoryProbe};
use scenelink_core::checkpoint::DEFAULT_LOW_MEMORY_BYTES;
use scenelink_core::commands::{
    register_checkpoint_commands, BatchCommandHandler, CommandContext, CommandError,
    CommandHandler, CommandRegistry, CommandRequest, RegistryError, ToolDescriptor, BATCH_ACTION,
};
use scenelink_core::document::Document;
use scenelink_core::mcp::ImagePayload;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

const KINDS: &[&str] = &["cube", "sphere", "light", "camera"];

/// One object in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub kind: String,
    pub position: [f64; 3],
}

/// The whole editable scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub objects: BTreeMap<String, SceneObject>,
}

impl Scene {
    /// Render a top-down SVG preview (x/z plane)
    pub fn render_svg(&self, size: u32) -> String {
        let half = f64::from(size) / 2.0;
        let mut svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}"><rect width="100%" height="100%" fill="#202020"/>"##
        );
        for (name, object) in &self.objects {
            let x = half + object.position[0] * 10.0;
            let y = half - object.position[2] * 10.0;
            let color = match object.kind.as_str() {
                "light" => "#ffd54f",
                "camera" => "#4fc3f7",
                _ => "#e0e0e0",
            };
            let name = escape_xml(name);
            // Writing to a String cannot fail
            let _ = write!(
                svg,
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="{color}"><title>{name}</title></circle>"#
            );
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneAction {
    AddObject,
    RemoveObject,
    ListObjects,
    RenderPreview,
}

impl SceneAction {
    pub const ALL: [SceneAction; 4] = [
        SceneAction::AddObject,
        SceneAction::RemoveObject,
        SceneAction::ListObjects,
        SceneAction::RenderPreview,
    ];

    pub fn action_name(self) -> &'static str {
        match self {
            SceneAction::AddObject => "add_object",
            SceneAction::RemoveObject => "remove_object",
            SceneAction::ListObjects => "list_objects",
            SceneAction::RenderPreview => "render_preview",
        }
    }
}

/// Object commands bound to the live scene
pub struct SceneCommand {
    action: SceneAction,
    document: Arc<Document<Scene>>,
}

impl SceneCommand {
    pub fn new(action: SceneAction, document: Arc<Document<Scene>>) -> Self {
        Self { action, document }
    }

    async fn add_object(&self, request: &CommandRequest) -> Result<Value, CommandError> {
        let name = request
            .str_param("name")
            .ok_or_else(|| CommandError::missing_param("name"))?
            .to_string();
        let kind = request.str_param("kind").unwrap_or("cube").to_string();
        if !KINDS.contains(&kind.as_str()) {
            return Err(CommandError::validation(format!(
                "Unknown object kind '{}' (expected one of {})",
                kind,
                KINDS.join(", ")
            )));
        }
        let position = match request.param("position") {
            Some(value) => serde_json::from_value::<[f64; 3]>(value.clone())?,
            None => [0.0; 3],
        };

        let object = SceneObject { kind, position };
        let added = self
            .document
            .with_state(|scene| {
                if scene.objects.contains_key(&name) {
                    return false;
                }
                scene.objects.insert(name.clone(), object.clone());
                true
            })
            .await?;

        if !added {
            return Err(CommandError::validation(format!(
                "Object '{}' already exists",
                name
            )));
        }
        debug!("Added {} '{}'", object.kind, name);
        Ok(json!({ "name": name, "object": object }))
    }

    async fn remove_object(&self, request: &CommandRequest) -> Result<Value, CommandError> {
        let name = request
            .str_param("name")
            .ok_or_else(|| CommandError::missing_param("name"))?
            .to_string();
        let removed = self
            .document
            .with_state(|scene| scene.objects.remove(&name))
            .await?;
        match removed {
            Some(object) => Ok(json!({ "removed": name, "object": object })),
            None => Err(CommandError::validation(format!(
                "Object '{}' not found",
                name
            ))),
        }
    }

    async fn list_objects(&self) -> Result<Value, CommandError> {
        let scene = self.document.snapshot().await?;
        Ok(json!({
            "count": scene.objects.len(),
            "objects": scene.objects,
        }))
    }

    async fn render_preview(&self, request: &CommandRequest) -> Result<Value, CommandError> {
        let size = request
            .param("size")
            .and_then(Value::as_u64)
            .unwrap_or(256)
            .clamp(32, 2048);
        let size = u32::try_from(size).unwrap_or(256);
        let scene = self.document.snapshot().await?;
        let svg = scene.render_svg(size);
        let image = ImagePayload::from_bytes(svg.as_bytes(), "image/svg+xml");
        Ok(json!({
            "object_count": scene.objects.len(),
            "size": size,
            "image": image.to_value(),
        }))
    }
}

#[async_trait]
impl CommandHandler for SceneCommand {
    async fn execute(
        &self,
        _ctx: CommandContext<'_>,
        request: &CommandRequest,
    ) -> Result<Value, CommandError> {
        match self.action {
            SceneAction::AddObject => self.add_object(request).await,
            SceneAction::RemoveObject => self.remove_object(request).await,
            SceneAction::ListObjects => self.list_objects().await,
            SceneAction::RenderPreview => self.render_preview(request).await,
        }
    }

    fn descriptor(&self) -> Option<ToolDescriptor> {
        let descriptor = match self.action {
            SceneAction::AddObject => ToolDescriptor::new(
                "Add a named object to the scene",
                json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "kind": { "type": "string", "enum": KINDS },
                        "position": {
                            "type": "array",
                            "items": { "type": "number" },
                            "minItems": 3,
                            "maxItems": 3
                        }
                    },
                    "required": ["name"]
                }),
            ),
            SceneAction::RemoveObject => ToolDescriptor::new(
                "Remove an object by name",
                json!({
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"]
                }),
            ),
            SceneAction::ListObjects => ToolDescriptor::new(
                "List every object in the scene",
                json!({ "type": "object", "properties": {} }),
            ),
            SceneAction::RenderPreview => ToolDescriptor::new(
                "Render a top-down preview image of the scene",
                json!({
                    "type": "object",
                    "properties": {
                        "size": { "type": "integer", "minimum": 32, "maximum": 2048 }
                    }
                }),
            )
            .with_alias("preview_scene"),
        };
        Some(descriptor)
    }
}

/// Build a registry with scene, checkpoint and batch commands over one scene
pub fn build_registry(document: Arc<Document<Scene>>) -> Result<CommandRegistry, RegistryError> {
    let checkpoints = Arc::new(CheckpointManager::with_memory_probe(
        CheckpointConfig::default(),
        Arc::new(SystemMemoryProbe::new(DEFAULT_LOW_MEMORY_BYTES)),
    ));

    let mut registry = CommandRegistry::new();
    for action in SceneAction::ALL {
        registry.register(
            action.action_name(),
            Arc::new(SceneCommand::new(action, Arc::clone(&document))),
        )?;
    }
    register_checkpoint_commands(&mut registry, document, checkpoints)?;
    registry.register(BATCH_ACTION, Arc::new(BatchCommandHandler::new()))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenelink_core::CommandResponse;

    fn setup() -> (Arc<Document<Scene>>, CommandRegistry) {
        let document = Arc::new(Document::new(Scene::default()));
        let registry = build_registry(Arc::clone(&document)).unwrap();
        (document, registry)
    }

    fn request(name: &str, params: Value) -> CommandRequest {
        CommandRequest::from_value(name, params)
    }

    #[tokio::test]
    async fn test_add_and_list_objects() {
        let (_, registry) = setup();

        let added = registry
            .dispatch(&request(
                "add_object",
                json!({ "name": "key_light", "kind": "light", "position": [1.0, 4.0, -2.0] }),
            ))
            .await;
        assert!(added.is_ok(), "{:?}", added);

        let listed = registry.dispatch(&request("list_objects", json!({}))).await;
        let data = listed.data().unwrap();
        assert_eq!(data["count"], 1);
        assert_eq!(data["objects"]["key_light"]["kind"], "light");
    }

    #[tokio::test]
    async fn test_validation_errors_are_plain_messages() {
        let (_, registry) = setup();

        let missing = registry.dispatch(&request("add_object", json!({}))).await;
        assert_eq!(missing.error_message(), Some("Missing 'name' parameter"));

        let bad_kind = registry
            .dispatch(&request("add_object", json!({ "name": "x", "kind": "teapot" })))
            .await;
        assert!(bad_kind
            .error_message()
            .unwrap()
            .starts_with("Unknown object kind 'teapot'"));

        let gone = registry
            .dispatch(&request("remove_object", json!({ "name": "ghost" })))
            .await;
        assert_eq!(gone, CommandResponse::error("Object 'ghost' not found"));
    }

    #[tokio::test]
    async fn test_checkpoint_undo_restores_scene() {
        let (document, registry) = setup();

        registry
            .dispatch(&request("create_checkpoint", json!({ "description": "empty" })))
            .await;
        registry
            .dispatch(&request("add_object", json!({ "name": "cube" })))
            .await;
        registry
            .dispatch(&request("create_checkpoint", json!({ "description": "one cube" })))
            .await;
        registry
            .dispatch(&request("remove_object", json!({ "name": "cube" })))
            .await;

        let undone = registry
            .dispatch(&request("undo_checkpoint", json!({})))
            .await;
        assert!(undone.is_ok(), "{:?}", undone);
        assert!(document.snapshot().await.unwrap().objects.is_empty());

        let restored = registry
            .dispatch(&request("restore_checkpoint", json!({ "id": 1 })))
            .await;
        assert!(restored.is_ok(), "{:?}", restored);
        assert!(document
            .snapshot()
            .await
            .unwrap()
            .objects
            .contains_key("cube"));
    }

    #[tokio::test]
    async fn test_batch_over_scene_commands() {
        let (document, registry) = setup();

        let response = registry
            .dispatch(&request(
                "batch",
                json!({
                    "commands": [
                        { "action": "add_object", "params": { "name": "a" } },
                        { "action": "add_object", "params": { "name": "a" } },
                        { "action": "add_object", "params": { "name": "b", "kind": "sphere" } }
                    ]
                }),
            ))
            .await;

        let data = response.data().unwrap();
        assert_eq!(data["total"], 3);
        assert_eq!(data["succeeded"], 2);
        assert_eq!(data["failed"], 1);
        assert_eq!(document.snapshot().await.unwrap().objects.len(), 2);
    }

    #[tokio::test]
    async fn test_render_preview_returns_image() {
        let (_, registry) = setup();
        registry
            .dispatch(&request("add_object", json!({ "name": "cam", "kind": "camera" })))
            .await;

        let response = registry
            .dispatch(&request("render_preview", json!({ "size": 64 })))
            .await;
        let data = response.data().unwrap();
        assert_eq!(data["image"]["mimeType"], "image/svg+xml");
        assert_eq!(data["size"], 64);
        assert_eq!(registry.resolve_tool("preview_scene"), Some("render_preview"));
    }

    #[test]
    fn test_render_svg_contains_objects() {
        let mut scene = Scene::default();
        scene.objects.insert(
            "sun".to_string(),
            SceneObject {
                kind: "light".to_string(),
                position: [0.0, 10.0, 0.0],
            },
        );
        let svg = scene.render_svg(100);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"cx="50.0" cy="50.0""#));
        assert!(svg.contains("<title>sun</title>"));
    }

    #[test]
    fn test_render_svg_escapes_object_names() {
        let mut scene = Scene::default();
        scene.objects.insert(
            r#"a<b&"c'>"#.to_string(),
            SceneObject {
                kind: "cube".to_string(),
                position: [0.0, 0.0, 0.0],
            },
        );
        let svg = scene.render_svg(100);
        assert!(svg.contains("<title>a&lt;b&amp;&quot;c&apos;&gt;</title>"));
        assert!(!svg.contains("a<b"));
    }
}
