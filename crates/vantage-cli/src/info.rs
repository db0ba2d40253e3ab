// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `vantage info`: decode a recording headlessly and summarise it.

use std::io::Read;

use anyhow::{Context, Result};
use comfy_table::Table;
use serde::Serialize;
use tracing::warn;
use vantage_app_core::settings::StreamSettings;
use vantage_proto::{routing, PacketStreamReader, ShapeKind, TransportError};
use vantage_scene_codec::{MockAdapter, SceneDecoder};

/// Packets seen on one routing id.
#[derive(Debug, Serialize)]
pub struct RoutingRow {
    pub routing_id: u16,
    pub handler: &'static str,
    pub packets: u64,
}

/// Rejections for one error code.
#[derive(Debug, Serialize)]
pub struct ErrorRow {
    pub code: u16,
    pub label: &'static str,
    pub count: u64,
}

/// Everything `info` reports about a recording.
#[derive(Debug, Serialize)]
pub struct StreamReport {
    pub packets: u64,
    pub crc_failures: u64,
    pub malformed: u64,
    pub skipped_bytes: u64,
    /// Bytes left in a packet cut off by the end of the file.
    pub truncated_bytes: Option<usize>,
    pub applied: u64,
    pub rejected: u64,
    pub ignored_transients: u64,
    pub frames: u64,
    pub announced_frames: Option<u32>,
    pub ended: bool,
    pub persistent_shapes: usize,
    pub visible_shapes: usize,
    pub meshes_ready: usize,
    pub meshes_pending: usize,
    pub categories: usize,
    pub routing: Vec<RoutingRow>,
    pub errors: Vec<ErrorRow>,
}

/// Handler name for a routing id.
pub fn handler_name(routing_id: u16) -> &'static str {
    match routing_id {
        routing::NULL => "null",
        routing::SERVER_INFO => "server-info",
        routing::CONTROL => "control",
        routing::COLLATED_PACKET => "collated",
        routing::MESH => "mesh",
        routing::CAMERA => "camera",
        routing::CATEGORY => "category",
        routing::MATERIAL => "material",
        id if id >= routing::USER_ID_START => "user",
        id => ShapeKind::from_routing_id(id).map_or("unassigned", ShapeKind::name),
    }
}

/// Decode `source` and build the report.
pub fn inspect<R: Read>(source: R, settings: &StreamSettings) -> Result<StreamReport> {
    let mut stream = PacketStreamReader::new(source);
    let mut decoder = SceneDecoder::new(MockAdapter::new())
        .with_ignore_transient(settings.decode.ignore_transient);

    let truncated_bytes = match decoder.consume(&mut stream) {
        Ok(()) => None,
        Err(TransportError::UnexpectedEof { pending }) => {
            warn!(pending, "recording ends inside a packet");
            Some(pending)
        }
        Err(err) => return Err(err).context("read recording"),
    };

    let transport = stream.stats();
    let stats = decoder.stats();
    Ok(StreamReport {
        packets: transport.packets,
        crc_failures: transport.crc_failures,
        malformed: transport.malformed,
        skipped_bytes: transport.skipped_bytes,
        truncated_bytes,
        applied: stats.applied,
        rejected: stats.rejected(),
        ignored_transients: stats.ignored_transients,
        frames: decoder.frame(),
        announced_frames: decoder.total_frames(),
        ended: decoder.is_ended(),
        persistent_shapes: decoder.shapes().persistent_len(),
        visible_shapes: decoder.port().last_visible,
        meshes_ready: decoder.resources().ready_len(),
        meshes_pending: decoder.resources().pending_len(),
        categories: decoder.categories().len(),
        routing: stats
            .by_routing
            .iter()
            .map(|(&routing_id, &packets)| RoutingRow {
                routing_id,
                handler: handler_name(routing_id),
                packets,
            })
            .collect(),
        errors: stats
            .errors
            .iter()
            .map(|(&code, &count)| ErrorRow {
                code: code.as_u16(),
                label: code.label(),
                count,
            })
            .collect(),
    })
}

/// Tables for the human readable report.
pub fn render(report: &StreamReport) -> Vec<Table> {
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_owned());

    let mut summary = Table::new();
    summary.set_header(vec!["metric", "value"]);
    for (metric, value) in [
        ("packets", report.packets.to_string()),
        ("crc failures", report.crc_failures.to_string()),
        ("malformed", report.malformed.to_string()),
        ("skipped bytes", report.skipped_bytes.to_string()),
        ("truncated bytes", opt(report.truncated_bytes.map(|n| n.to_string()))),
        ("applied", report.applied.to_string()),
        ("rejected", report.rejected.to_string()),
        ("ignored transients", report.ignored_transients.to_string()),
        ("frames", report.frames.to_string()),
        ("announced frames", opt(report.announced_frames.map(|n| n.to_string()))),
        ("ended", report.ended.to_string()),
        ("persistent shapes", report.persistent_shapes.to_string()),
        ("visible at last frame", report.visible_shapes.to_string()),
        ("meshes ready", report.meshes_ready.to_string()),
        ("meshes pending", report.meshes_pending.to_string()),
        ("categories", report.categories.to_string()),
    ] {
        summary.add_row(vec![metric.to_owned(), value]);
    }

    let mut routing = Table::new();
    routing.set_header(vec!["routing id", "handler", "packets"]);
    for row in &report.routing {
        routing.add_row(vec![
            row.routing_id.to_string(),
            row.handler.to_owned(),
            row.packets.to_string(),
        ]);
    }

    let mut tables = vec![summary, routing];
    if !report.errors.is_empty() {
        let mut errors = Table::new();
        errors.set_header(vec!["code", "error", "count"]);
        for row in &report.errors {
            errors.add_row(vec![
                row.code.to_string(),
                row.label.to_owned(),
                row.count.to_string(),
            ]);
        }
        tables.push(errors);
    }
    tables
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use vantage_proto::{ControlId, ControlMessage, PacketWriter, WireMessage};
    use vantage_shapes::{Renderable, Sphere};

    #[test]
    fn handler_names_cover_every_range() {
        assert_eq!(handler_name(routing::CONTROL), "control");
        assert_eq!(handler_name(ShapeKind::Sphere.routing_id()), "sphere");
        assert_eq!(handler_name(40), "unassigned");
        assert_eq!(handler_name(routing::USER_ID_START + 3), "user");
    }

    #[test]
    fn reports_a_truncated_tail() {
        let mut bytes = Vec::new();
        let mut w = PacketWriter::default();
        Sphere::new(1).write_create(&mut w).unwrap();
        bytes.extend_from_slice(&w.finish());
        w.reset(routing::CONTROL, ControlId::EndFrame.raw());
        ControlMessage::default().write(&mut w).unwrap();
        let end = w.finish();
        bytes.extend_from_slice(&end[..end.len() - 4]);

        let report = inspect(Cursor::new(bytes), &StreamSettings::default()).unwrap();
        assert_eq!(report.packets, 1);
        assert_eq!(report.persistent_shapes, 1);
        assert!(report.truncated_bytes.is_some());
        assert_eq!(report.frames, 0);
        assert_eq!(render(&report).len(), 2);
    }
}
