use activesync_wbxml::{Document, Element};
use criterion::criterion_main;

mod decode;

/// Builds a Sync response carrying `items` email additions.
pub(crate) fn sync_response(items: usize, body_len: usize) -> Document {
    let body = "x".repeat(body_len);
    let mut commands = Element::new("AirSync", "Commands");
    for i in 0..items {
        commands = commands.with(
            Element::new("AirSync", "Add")
                .with(Element::new("AirSync", "ServerId").with_text(format!("5:{i}")))
                .with(
                    Element::new("AirSync", "ApplicationData")
                        .with(Element::new("Email", "Subject").with_text(format!("Message {i}")))
                        .with(Element::new("Email", "From").with_text("ann@example.com"))
                        .with(Element::new("Email", "Read").with_text("0"))
                        .with(
                            Element::new("Email2", "ConversationIndex")
                                .with_opaque(vec![0xCA, 0xFE, 0x00, i as u8]),
                        )
                        .with(
                            Element::new("AirSyncBase", "Body")
                                .with(Element::new("AirSyncBase", "Type").with_text("1"))
                                .with(Element::new("AirSyncBase", "Data").with_text(body.clone())),
                        ),
                ),
        );
    }
    Document::new(
        Element::new("AirSync", "Sync").with(
            Element::new("AirSync", "Collections").with(
                Element::new("AirSync", "Collection")
                    .with(Element::new("AirSync", "SyncKey").with_text("42"))
                    .with(Element::new("AirSync", "CollectionId").with_text("5"))
                    .with(Element::new("AirSync", "Status").with_text("1"))
                    .with(commands),
            ),
        ),
    )
}

criterion_main!(encode::benches, decode::benches);
