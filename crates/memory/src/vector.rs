//! Vector similarity utilities shared by every index.

use henrybot_core::Document;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Score every candidate against `query` and keep the best `top_k`.
///
/// Results are sorted by descending similarity with `score` filled in. Ties
/// keep no particular order.
pub fn rank_by_similarity<'a, I>(candidates: I, query: &[f32], top_k: usize) -> Vec<Document>
where
    I: IntoIterator<Item = (&'a Document, &'a [f32])>,
{
    let mut scored: Vec<(f32, &Document)> = candidates
        .into_iter()
        .map(|(doc, embedding)| (cosine_similarity(embedding, query), doc))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(score, doc)| {
            let mut doc = doc.clone();
            doc.score = Some(score);
            doc
        })
        .collect()
}

/// Serialize an embedding as little-endian f32 bytes.
pub fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn ranking_orders_and_truncates() {
        let a = Document::new("orthogonal");
        let b = Document::new("identical");
        let c = Document::new("partial");
        let ea = vec![0.0, 1.0, 0.0];
        let eb = vec![1.0, 0.0, 0.0];
        let ec = vec![0.5, 0.5, 0.0];

        let ranked = rank_by_similarity(
            [(&a, ea.as_slice()), (&b, eb.as_slice()), (&c, ec.as_slice())],
            &[1.0, 0.0, 0.0],
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].content, "identical");
        assert_eq!(ranked[1].content, "partial");
        assert!(ranked[0].score.unwrap() > ranked[1].score.unwrap());
    }

    #[test]
    fn blob_round_trip() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&v)), v);
    }
}
