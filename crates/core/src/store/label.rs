//! `node_labels` (label segments, §3) persistence.
use sqlx::FromRow;

use crate::err::Result;
use crate::model::{LabelSegment, NodeId};

use super::Store;

#[derive(Debug, FromRow)]
struct LabelSegmentRow {
	id: i64,
	node_id: NodeId,
	title: Option<String>,
	code_segment: Option<String>,
	position_start: Option<i32>,
	position_end: Option<i32>,
	label_de: Option<String>,
	label_en: Option<String>,
	display_order: i32,
}

impl From<LabelSegmentRow> for LabelSegment {
	fn from(r: LabelSegmentRow) -> Self {
		LabelSegment {
			id: Some(r.id),
			node_id: r.node_id,
			title: r.title,
			code_segment: r.code_segment,
			position_start: r.position_start,
			position_end: r.position_end,
			label_de: r.label_de,
			label_en: r.label_en,
			display_order: r.display_order,
		}
	}
}

impl Store {
	pub async fn label_segments_for(&self, node_id: NodeId) -> Result<Vec<LabelSegment>> {
		let rows: Vec<LabelSegmentRow> = sqlx::query_as(
			"SELECT id, node_id, title, code_segment, position_start, position_end, label_de, label_en, display_order
			 FROM node_labels WHERE node_id = $1 ORDER BY display_order ASC",
		)
		.bind(node_id)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	/// Replace every label segment belonging to `node_id` with `segments`
	/// (used by import and by the admin label re-parse endpoint).
	pub async fn replace_label_segments(
		&self,
		node_id: NodeId,
		segments: &[LabelSegment],
	) -> Result<()> {
		let mut tx = self.pool.begin().await?;
		sqlx::query("DELETE FROM node_labels WHERE node_id = $1")
			.bind(node_id)
			.execute(&mut *tx)
			.await?;
		for seg in segments {
			sqlx::query(
				"INSERT INTO node_labels (node_id, title, code_segment, position_start, position_end, label_de, label_en, display_order)
				 VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
			)
			.bind(node_id)
			.bind(&seg.title)
			.bind(&seg.code_segment)
			.bind(seg.position_start)
			.bind(seg.position_end)
			.bind(&seg.label_de)
			.bind(&seg.label_en)
			.bind(seg.display_order)
			.execute(&mut *tx)
			.await?;
		}
		tx.commit().await?;
		Ok(())
	}
}
