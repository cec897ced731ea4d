//! Cosine k-NN search with category/tag filters, pagination, and
//! access-count bookkeeping.
//!
//! Vectors are scanned and ranked in Rust: distances stay in f32 from the
//! stored blobs through the comparison, so thresholds behave identically
//! across platforms.

use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection};

use engram_core::models::SearchResult;
use engram_core::{EngramResult, MemoryCategory, MemoryEntry};

use crate::to_storage_err;

use super::bytes_to_f32_vec;
use super::memory_crud::row_to_entry;

/// Filters shared by the ranking query and the total-count query.
pub struct SearchFilters<'a> {
    pub category: Option<MemoryCategory>,
    pub tags: Option<&'a [String]>,
}

impl SearchFilters<'_> {
    /// `(where_clause, params)`; the tag filter matches memories carrying
    /// ANY of the given tags inside their JSON tag array.
    fn to_sql(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(category) = self.category {
            clauses.push("m.category = ?".to_string());
            params.push(category.as_str().to_string());
        }
        if let Some(tags) = self.tags {
            let conditions: Vec<String> = tags
                .iter()
                .map(|tag| {
                    params.push(tag.clone());
                    "EXISTS (SELECT 1 FROM json_each(m.tags) WHERE value = ?)".to_string()
                })
                .collect();
            clauses.push(format!("({})", conditions.join(" OR ")));
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

/// Total rows matching the filters, independent of limit/offset.
pub fn count_matching(conn: &Connection, filters: &SearchFilters<'_>) -> EngramResult<usize> {
    let (where_clause, params) = filters.to_sql();
    let sql = format!(
        "SELECT COUNT(*) FROM memory_metadata m JOIN memory_vectors v ON m.id = v.id{where_clause}"
    );
    let count: i64 = conn
        .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}

/// Rank all matching memories by cosine distance to the query embedding,
/// apply pagination, and bump access counters for exactly the returned
/// rows. Returns `(page, total_matching)`.
///
/// The returned entries reflect the post-increment access count. Caller
/// owns the transaction.
pub fn search(
    conn: &Connection,
    query_embedding: &[f32],
    limit: usize,
    offset: usize,
    filters: &SearchFilters<'_>,
    now: DateTime<Utc>,
) -> EngramResult<(Vec<SearchResult>, usize)> {
    let total = count_matching(conn, filters)?;

    let (where_clause, params) = filters.to_sql();
    let sql = format!(
        "SELECT m.id, m.content_hash, m.content, m.category, m.tags,
                m.created_at, m.updated_at, m.access_count, v.embedding
         FROM memory_metadata m
         JOIN memory_vectors v ON m.id = v.id{where_clause}"
    );

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            let entry = row_to_entry(row);
            let blob: Vec<u8> = row.get(8)?;
            Ok((entry, blob))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut scored: Vec<(MemoryEntry, f32)> = Vec::new();
    for row in rows {
        let (entry, blob) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let entry = entry?;
        let stored = bytes_to_f32_vec(&blob);
        let distance = cosine_distance(query_embedding, &stored);
        scored.push((entry, distance));
    }

    // Ascending distance; ties broken by id so pagination is stable.
    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    });

    let page: Vec<(MemoryEntry, f32)> =
        scored.into_iter().skip(offset).take(limit).collect();

    if !page.is_empty() {
        bump_access_counts(conn, &page, now)?;
    }

    let results = page
        .into_iter()
        .map(|(mut entry, distance)| {
            entry.access_count += 1;
            entry.updated_at = now;
            SearchResult {
                memory: entry,
                similarity: 1.0 - distance,
                distance,
            }
        })
        .collect();

    Ok((results, total))
}

/// Increment access_count and touch updated_at for the returned rows.
fn bump_access_counts(
    conn: &Connection,
    page: &[(MemoryEntry, f32)],
    now: DateTime<Utc>,
) -> EngramResult<()> {
    let placeholders = vec!["?"; page.len()].join(",");
    let sql = format!(
        "UPDATE memory_metadata
         SET access_count = access_count + 1, updated_at = ?
         WHERE id IN ({placeholders})"
    );
    let mut params: Vec<rusqlite::types::Value> =
        vec![rusqlite::types::Value::Text(now.to_rfc3339())];
    params.extend(
        page.iter()
            .map(|(entry, _)| rusqlite::types::Value::Integer(entry.id)),
    );
    conn.execute(&sql, params_from_iter(params.iter()))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// f32 cosine distance: `1 - cos(a, b)`. Zero-norm vectors are maximally
/// distant.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}
