//! The embedding dataset: per-object metadata records index-aligned with an
//! embedding matrix.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{EmbedCloudError, EmbedCloudResult};

/// Reserved class label for whole-image embeddings (records without an
/// object class).
pub const IMAGE_SERIES: &str = "Image";

/// Metadata for a single embedded object or image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub image_id: i64,
    /// `None` for whole-image embeddings.
    pub object_id: Option<i64>,
    /// `None` for whole-image embeddings; such records are presented under
    /// the reserved `Image` series.
    pub object_class: Option<String>,
}

impl EmbeddingRecord {
    /// The class label used for chart grouping.
    pub fn class_label(&self) -> &str {
        self.object_class.as_deref().unwrap_or(IMAGE_SERIES)
    }
}

/// Columnar layout of the `*_info.json` artifact: parallel arrays,
/// index-aligned with the embedding matrix rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoColumns {
    pub image_id: Vec<i64>,
    pub object_id: Vec<Option<i64>>,
    pub object_cls: Vec<Option<String>>,
}

impl InfoColumns {
    /// Transposes the columns into one record per row.
    ///
    /// All columns must have equal length.
    pub fn into_records(self) -> EmbedCloudResult<Vec<EmbeddingRecord>> {
        let n = self.image_id.len();
        if self.object_id.len() != n || self.object_cls.len() != n {
            return Err(EmbedCloudError::Deserialization(format!(
                "info columns have unequal lengths: image_id={}, object_id={}, object_cls={}",
                n,
                self.object_id.len(),
                self.object_cls.len()
            )));
        }
        Ok(self
            .image_id
            .into_iter()
            .zip(self.object_id)
            .zip(self.object_cls)
            .map(|((image_id, object_id), object_class)| EmbeddingRecord {
                image_id,
                object_id,
                object_class,
            })
            .collect())
    }
}

/// An immutable collection of embedding records and their vectors.
///
/// Row `i` of `embeddings` belongs to `records[i]`; the equal-length
/// invariant is enforced at construction.
#[derive(Debug, Clone)]
pub struct EmbeddingDataset {
    records: Vec<EmbeddingRecord>,
    embeddings: Array2<f32>,
}

impl EmbeddingDataset {
    pub fn new(records: Vec<EmbeddingRecord>, embeddings: Array2<f32>) -> EmbedCloudResult<Self> {
        if records.len() != embeddings.nrows() {
            return Err(EmbedCloudError::LengthMismatch {
                records: records.len(),
                rows: embeddings.nrows(),
            });
        }
        Ok(EmbeddingDataset { records, embeddings })
    }

    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimensionality of the embedding vectors.
    pub fn dimensions(&self) -> usize {
        self.embeddings.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn record(image_id: i64, class: Option<&str>) -> EmbeddingRecord {
        EmbeddingRecord {
            image_id,
            object_id: class.map(|_| image_id * 10),
            object_class: class.map(str::to_string),
        }
    }

    #[test]
    fn test_new_enforces_length_invariant() {
        let records = vec![record(1, Some("car")), record(2, None)];
        let embeddings = arr2(&[[0.0f32, 1.0], [2.0, 3.0], [4.0, 5.0]]);
        let err = EmbeddingDataset::new(records, embeddings).unwrap_err();
        assert!(matches!(err, EmbedCloudError::LengthMismatch { records: 2, rows: 3 }));
    }

    #[test]
    fn test_dataset_accessors() {
        let records = vec![record(1, Some("car")), record(2, None)];
        let embeddings = arr2(&[[0.0f32, 1.0, 2.0], [3.0, 4.0, 5.0]]);
        let dataset = EmbeddingDataset::new(records, embeddings).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dimensions(), 3);
        assert_eq!(dataset.records()[0].class_label(), "car");
        assert_eq!(dataset.records()[1].class_label(), IMAGE_SERIES);
    }

    #[test]
    fn test_info_columns_transpose() {
        let columns = InfoColumns {
            image_id: vec![10, 11],
            object_id: vec![Some(100), None],
            object_cls: vec![Some("dog".to_string()), None],
        };
        let records = columns.into_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image_id, 10);
        assert_eq!(records[0].object_id, Some(100));
        assert_eq!(records[0].class_label(), "dog");
        assert_eq!(records[1].class_label(), IMAGE_SERIES);
    }

    #[test]
    fn test_info_columns_unequal_lengths() {
        let columns = InfoColumns {
            image_id: vec![10, 11],
            object_id: vec![Some(100)],
            object_cls: vec![None, None],
        };
        assert!(matches!(
            columns.into_records(),
            Err(EmbedCloudError::Deserialization(_))
        ));
    }

    #[test]
    fn test_info_columns_json_shape() {
        // Matches the columnar artifact layout produced by the embedding
        // calculator: one parallel array per field.
        let json = r#"{"image_id":[1,2],"object_id":[5,null],"object_cls":["cat",null]}"#;
        let columns: InfoColumns = serde_json::from_str(json).unwrap();
        let records = columns.into_records().unwrap();
        assert_eq!(records[0].object_id, Some(5));
        assert_eq!(records[1].object_class, None);
    }
}
