//! Tool definitions offered to the model and decoding of its calls.
//!
//! The implementation-context loop offers exactly three tools. Story
//! breakdown offers only `create_stories`. All schemas are strict: every
//! property is required and nothing undeclared is accepted.

use super::responses::FunctionCall;
use serde::Serialize;
use serde_json::{json, Map, Value};

pub const LIST_PATHS: &str = "list_paths";
pub const READ_FILE: &str = "read_file";
pub const EMIT_IMPLEMENTATION_CONTEXT: &str = "emit_implementation_context";
pub const CREATE_STORIES: &str = "create_stories";

/// A function tool in Responses API form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
    pub strict: bool,
}

impl ToolDefinition {
    fn function(name: &'static str, description: &'static str, parameters: Value) -> Self {
        Self {
            tool_type: "function",
            name,
            description,
            parameters,
            strict: true,
        }
    }
}

pub fn list_paths_tool() -> ToolDefinition {
    ToolDefinition::function(
        LIST_PATHS,
        "List repo-relative file paths under a directory. Use \"\" or \".\" for the repository root.",
        json!({
            "type": "object",
            "properties": {"directory": {"type": "string"}},
            "required": ["directory"],
            "additionalProperties": false
        }),
    )
}

pub fn read_file_tool() -> ToolDefinition {
    ToolDefinition::function(
        READ_FILE,
        "Read a repo-relative file. Large files are truncated.",
        json!({
            "type": "object",
            "properties": {"path": {"type": "string"}},
            "required": ["path"],
            "additionalProperties": false
        }),
    )
}

pub fn emit_implementation_context_tool() -> ToolDefinition {
    ToolDefinition::function(
        EMIT_IMPLEMENTATION_CONTEXT,
        "Emit the final implementation context and stop calling tools.",
        json!({
            "type": "object",
            "properties": {
                "files": {"type": "array", "items": {"type": "string"}},
                "notes": {"type": "string"}
            },
            "required": ["files", "notes"],
            "additionalProperties": false
        }),
    )
}

pub fn create_stories_tool() -> ToolDefinition {
    ToolDefinition::function(
        CREATE_STORIES,
        "Create a list of user stories",
        json!({
            "type": "object",
            "properties": {
                "stories": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {
                                "type": "string",
                                "description": "The title of the user story"
                            },
                            "acceptance_criteria": {
                                "type": "array",
                                "items": {"type": "string"},
                                "description": "The acceptance criteria for the user story"
                            }
                        },
                        "required": ["title", "acceptance_criteria"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["stories"],
            "additionalProperties": false
        }),
    )
}

/// The tool set for the implementation-context loop.
pub fn context_tools() -> Vec<ToolDefinition> {
    vec![
        list_paths_tool(),
        read_file_tool(),
        emit_implementation_context_tool(),
    ]
}

/// A decoded context-loop tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextToolCall {
    ListPaths { directory: String },
    ReadFile { path: String },
    EmitContext { files: Vec<String>, notes: String },
    Unknown { name: String },
}

impl ContextToolCall {
    /// Decode a wire-level call. Arguments that are not a JSON object are
    /// treated as empty, so a malformed call still maps to its tool.
    pub fn decode(call: &FunctionCall) -> Self {
        let args = parse_arguments(&call.arguments);
        match call.name.as_str() {
            LIST_PATHS => ContextToolCall::ListPaths {
                directory: string_arg(&args, "directory"),
            },
            READ_FILE => ContextToolCall::ReadFile {
                path: string_arg(&args, "path"),
            },
            EMIT_IMPLEMENTATION_CONTEXT => ContextToolCall::EmitContext {
                files: file_list_arg(&args),
                notes: notes_arg(&args),
            },
            other => ContextToolCall::Unknown {
                name: other.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ContextToolCall::ListPaths { .. } => LIST_PATHS,
            ContextToolCall::ReadFile { .. } => READ_FILE,
            ContextToolCall::EmitContext { .. } => EMIT_IMPLEMENTATION_CONTEXT,
            ContextToolCall::Unknown { name } => name,
        }
    }
}

fn parse_arguments(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn string_arg(args: &Map<String, Value>, key: &str) -> String {
    match args.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// String entries only, blanks dropped, first occurrence wins.
fn file_list_arg(args: &Map<String, Value>) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    let Some(Value::Array(items)) = args.get("files") else {
        return files;
    };
    for item in items {
        if let Value::String(path) = item {
            if !path.trim().is_empty() && !files.contains(path) {
                files.push(path.clone());
            }
        }
    }
    files
}

fn notes_arg(args: &Map<String, Value>) -> String {
    match args.get("notes") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: &str) -> FunctionCall {
        FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
            call_id: "call_1".to_string(),
        }
    }

    #[test]
    fn test_context_tools_are_strict_and_closed() {
        let tools = context_tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![LIST_PATHS, READ_FILE, EMIT_IMPLEMENTATION_CONTEXT]
        );
        for tool in &tools {
            assert!(tool.strict);
            assert_eq!(tool.parameters["additionalProperties"], false);
            let props = tool.parameters["properties"].as_object().unwrap();
            let required = tool.parameters["required"].as_array().unwrap();
            assert_eq!(props.len(), required.len(), "{}", tool.name);
        }
    }

    #[test]
    fn test_tool_definition_serialization() {
        let json = serde_json::to_value(list_paths_tool()).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["name"], "list_paths");
        assert_eq!(json["strict"], true);
        assert_eq!(json["parameters"]["required"][0], "directory");
    }

    #[test]
    fn test_create_stories_schema_requires_title_and_criteria() {
        let tool = create_stories_tool();
        let item = &tool.parameters["properties"]["stories"]["items"];
        assert_eq!(item["required"], json!(["title", "acceptance_criteria"]));
        assert_eq!(item["additionalProperties"], false);
    }

    #[test]
    fn test_decode_known_tools() {
        assert_eq!(
            ContextToolCall::decode(&call("list_paths", r#"{"directory":"src"}"#)),
            ContextToolCall::ListPaths {
                directory: "src".to_string()
            }
        );
        assert_eq!(
            ContextToolCall::decode(&call("read_file", r#"{"path":"src/a.py","max_bytes":64}"#)),
            ContextToolCall::ReadFile {
                path: "src/a.py".to_string()
            }
        );
    }

    #[test]
    fn test_decode_emit_filters_files() {
        let decoded = ContextToolCall::decode(&call(
            "emit_implementation_context",
            r#"{"files":["src/a.py", "", "  ", 42, null, "src/a.py", "src/b.py"],"notes":"Do it"}"#,
        ));
        assert_eq!(
            decoded,
            ContextToolCall::EmitContext {
                files: vec!["src/a.py".to_string(), "src/b.py".to_string()],
                notes: "Do it".to_string()
            }
        );
    }

    #[test]
    fn test_decode_malformed_arguments_as_empty() {
        assert_eq!(
            ContextToolCall::decode(&call("list_paths", "{not json")),
            ContextToolCall::ListPaths {
                directory: String::new()
            }
        );
        assert_eq!(
            ContextToolCall::decode(&call("emit_implementation_context", "[1,2]")),
            ContextToolCall::EmitContext {
                files: Vec::new(),
                notes: String::new()
            }
        );
    }

    #[test]
    fn test_decode_non_string_notes_are_stringified() {
        let decoded = ContextToolCall::decode(&call(
            "emit_implementation_context",
            r#"{"files":[],"notes":7}"#,
        ));
        assert_eq!(
            decoded,
            ContextToolCall::EmitContext {
                files: Vec::new(),
                notes: "7".to_string()
            }
        );
    }

    #[test]
    fn test_decode_unknown_tool() {
        let decoded = ContextToolCall::decode(&call("shell", r#"{"command":"ls"}"#));
        assert_eq!(decoded.name(), "shell");
        assert!(matches!(decoded, ContextToolCall::Unknown { .. }));
    }
}
