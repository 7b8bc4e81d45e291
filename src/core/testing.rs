//! Helpers shared by unit tests

use crate::config::{BuildConfig, ByteOrder};
use crate::core::collect::FileRecord;
use crate::core::layout::ImageLayout;

/// Assemble an image in memory from (name, content) pairs
pub fn assemble(files: &[(&str, &[u8])], order: ByteOrder) -> Vec<u8> {
    let config = BuildConfig::builder("src", "out.img")
        .byte_order(order)
        .build();
    let layout = ImageLayout::build(
        files.iter().map(|(name, content)| FileRecord {
            relative_path: name.to_string(),
            size: content.len() as u64,
        }),
        &config,
    )
    .unwrap();

    let mut bytes = layout.prefix().to_vec();
    for placement in layout.placements() {
        let (_, content) = files
            .iter()
            .find(|(name, _)| *name == placement.relative_path)
            .unwrap();
        bytes.extend_from_slice(content);
        bytes.extend_from_slice(&placement.name);
        bytes.push(0);
    }
    bytes
}
