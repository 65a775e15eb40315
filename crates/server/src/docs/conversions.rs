//! Conversions between Google Docs wire types and core types.

use checkmark_core::{ContentUnit, DocumentSnapshot, EditBatch, EditOperation, TextRun};

use super::types::{
    BatchUpdateRequest, Color, Document, InsertTextRequest, Location, OptionalColor, Range,
    Request, RgbColor, StructuralElement, TextStyle, UpdateTextStyleRequest, WriteControl,
};

/// Field mask for the background colour style property.
const BACKGROUND_COLOR_FIELD: &str = "backgroundColor";

/// Convert a fetched document into a snapshot.
#[must_use]
pub fn convert_document(document: Document) -> DocumentSnapshot {
    DocumentSnapshot {
        revision_id: document.revision_id,
        content: document
            .body
            .unwrap_or_default()
            .content
            .into_iter()
            .map(convert_element)
            .collect(),
    }
}

fn convert_element(element: StructuralElement) -> ContentUnit {
    let text_runs = element
        .paragraph
        .map(|paragraph| {
            paragraph
                .elements
                .into_iter()
                .filter_map(|el| {
                    let content = el.text_run?.content?;
                    Some(TextRun {
                        start_index: el.start_index,
                        content,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    ContentUnit {
        start_index: element.start_index,
        end_index: element.end_index,
        text_runs,
    }
}

/// Convert an edit batch into a `batchUpdate` body.
#[must_use]
pub fn convert_batch(batch: &EditBatch) -> BatchUpdateRequest {
    BatchUpdateRequest {
        requests: batch.operations.iter().map(convert_operation).collect(),
        write_control: batch
            .required_revision_id
            .clone()
            .map(|required_revision_id| WriteControl {
                required_revision_id,
            }),
    }
}

fn convert_operation(operation: &EditOperation) -> Request {
    match operation {
        EditOperation::StyleRange {
            start,
            end,
            background,
        } => Request::UpdateTextStyle(UpdateTextStyleRequest {
            range: Range {
                start_index: *start,
                end_index: *end,
            },
            text_style: TextStyle {
                background_color: OptionalColor {
                    color: Color {
                        rgb_color: RgbColor {
                            red: background.red,
                            green: background.green,
                            blue: background.blue,
                        },
                    },
                },
            },
            fields: BACKGROUND_COLOR_FIELD.to_string(),
        }),
        EditOperation::InsertText { index, text } => Request::InsertText(InsertTextRequest {
            location: Location { index: *index },
            text: text.clone(),
        }),
    }
}
