use log::{debug, warn};
use serde_json::Value;

use crate::model::RecipeItem;
use crate::upstream::wire::{Envelope, RawResult};
use crate::upstream::RawSearchResponse;

/// A raw response reduced to a flat, ranked item list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPage {
    pub items: Vec<RecipeItem>,
    pub last_updated: Option<String>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_matched: u64,
}

/// Reduce any supported response shape to a [`NormalizedPage`]
///
/// A missing or malformed `result` yields an empty page rather than an error.
/// Envelope items without a rank get `(page - 1) * hits + index + 1`; flat
/// arrays pass ranks through untouched.
pub fn normalize(raw: RawSearchResponse) -> NormalizedPage {
    let top_level_updated = raw.last_updated;

    match RawResult::classify(raw.result) {
        RawResult::Items(values) => {
            let items = decode_items(values);
            let len = items.len() as u64;
            debug!("Normalized flat result with {} items", len);
            NormalizedPage {
                items,
                last_updated: top_level_updated,
                page_number: 1,
                page_size: len,
                total_matched: len,
            }
        }
        RawResult::Envelope(envelope) => normalize_envelope(envelope, top_level_updated),
        RawResult::Missing => {
            debug!("Response carried no usable result");
            NormalizedPage {
                last_updated: top_level_updated,
                page_number: 1,
                ..Default::default()
            }
        }
    }
}

fn normalize_envelope(envelope: Envelope, top_level_updated: Option<String>) -> NormalizedPage {
    let Envelope {
        recipe,
        page,
        hits,
        count,
        last_updated,
    } = envelope;

    let page_number = page.filter(|p| *p > 0).unwrap_or(1);
    let mut items = decode_items(recipe);
    let page_size = hits
        .filter(|h| *h > 0)
        .unwrap_or(items.len() as u64);

    // page and hits come straight from upstream; ranks past u64 stay unset
    let offset = (page_number - 1).checked_mul(page_size);
    for (index, item) in items.iter_mut().enumerate() {
        if item.rank.is_some() {
            continue;
        }
        match offset.and_then(|offset| offset.checked_add(index as u64 + 1)) {
            Some(rank) => item.rank = Some(rank.to_string()),
            None => warn!(
                "Rank of recipe {} overflows page {} x {}",
                item.id, page_number, page_size
            ),
        }
    }

    debug!(
        "Normalized envelope page {} ({} per page) with {} items",
        page_number,
        page_size,
        items.len()
    );

    NormalizedPage {
        total_matched: count.unwrap_or(items.len() as u64),
        items,
        last_updated: last_updated.or(top_level_updated),
        page_number,
        page_size,
    }
}

fn decode_items(values: Vec<Value>) -> Vec<RecipeItem> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed recipe at position {}: {}", index, e);
                None
            }
        })
        .collect()
}
