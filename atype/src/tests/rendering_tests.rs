//! Rendering tests - JSON Schema documents and markdown output.

use crate::{Field, FieldType, Schema, SchemaRef, parse_schema};
use serde_json::json;

fn ticket() -> SchemaRef {
    Schema::builder("Ticket")
        .description("Support ticket")
        .field(Field::required("id", FieldType::Integer))
        .field(Field::required("title", FieldType::String).with_description("Short title"))
        .field(Field::optional(
            "tags",
            FieldType::optional(FieldType::list(FieldType::String)),
        ))
        .build()
        .unwrap()
}

#[test]
fn test_json_schema_snapshot() {
    let doc = serde_json::to_string_pretty(&ticket().to_json_schema()).unwrap();
    insta::assert_snapshot!(doc, @r#"
{
  "title": "Ticket",
  "description": "Support ticket",
  "type": "object",
  "properties": {
    "id": {
      "type": "integer"
    },
    "title": {
      "type": "string",
      "description": "Short title"
    },
    "tags": {
      "anyOf": [
        {
          "type": "array",
          "items": {
            "type": "string"
          }
        },
        {
          "type": "null"
        }
      ]
    }
  },
  "required": [
    "id",
    "title"
  ]
}
"#);
}

#[test]
fn test_markdown_snapshot() {
    let record = ticket()
        .record(json!({ "id": 4, "title": "Printer on fire", "tags": ["hw"] }))
        .unwrap();
    insta::assert_snapshot!(record.to_markdown().trim_end(), @r#"
### Ticket
- **id**: 4
- **title**: Printer on fire
- **tags**: ["hw"]
"#);
}

#[test]
fn test_dsl_schema_matches_builder_schema() {
    let parsed = parse_schema(
        r#"
        /// Support ticket
        struct Ticket {
            id: i64,
            /// Short title
            title: String,
            tags: Option<Vec<String>>,
        }
        "#,
    )
    .unwrap();

    assert_eq!(parsed.to_json_schema(), ticket().to_json_schema());
}
