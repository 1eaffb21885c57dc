//! COCO format data structures and utilities
//!
//! The corpus file carries exactly three top-level fields (`images`,
//! `annotations`, `categories`). Downstream training and evaluation code reads
//! these field names directly, so the layout here must not drift.
//!
//! Fields outside that layout in a loaded corpus (`supercategory`, `license`,
//! ...) are kept in `extra` and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{ConvertError, Result};

/// COCO category information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(id: u32, name: String) -> Self {
        Self {
            id,
            name,
            extra: Map::new(),
        }
    }
}

/// COCO image information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u32,
    /// Path relative to the image root, always `/`-separated.
    pub file_name: String,
    pub height: u32,
    pub width: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Image {
    pub fn new(id: u32, file_name: String, height: u32, width: u32) -> Self {
        Self {
            id,
            file_name,
            height,
            width,
            extra: Map::new(),
        }
    }
}

/// COCO annotation information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u32,
    pub image_id: u32,
    pub category_id: u32,
    pub segmentation: Vec<Vec<f64>>,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub area: f64,
    pub iscrowd: u8,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    /// Build a non-crowd annotation from a derived shape geometry.
    pub fn from_geometry(
        id: u32,
        image_id: u32,
        category_id: u32,
        geometry: ShapeGeometry,
    ) -> Self {
        Self {
            id,
            image_id,
            category_id,
            segmentation: vec![geometry.polygon],
            bbox: geometry.bbox,
            area: geometry.area,
            iscrowd: 0,
            extra: Map::new(),
        }
    }
}

/// Complete COCO corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CocoFile {
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

impl CocoFile {
    /// Read a corpus from disk and check its referential integrity.
    pub fn load(path: &Path) -> Result<Self> {
        let load_error = |message: String| ConvertError::CorpusLoad {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| load_error(e.to_string()))?;
        let coco: CocoFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| load_error(e.to_string()))?;
        coco.validate().map_err(load_error)?;
        Ok(coco)
    }

    /// Check that ids are unique and every annotation points at a known
    /// image and category.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut image_ids = HashSet::with_capacity(self.images.len());
        for image in &self.images {
            if !image_ids.insert(image.id) {
                return Err(format!("duplicate image id {}", image.id));
            }
        }

        let mut category_ids = HashSet::with_capacity(self.categories.len());
        for category in &self.categories {
            if !category_ids.insert(category.id) {
                return Err(format!("duplicate category id {}", category.id));
            }
        }

        let mut annotation_ids = HashSet::with_capacity(self.annotations.len());
        for ann in &self.annotations {
            if !annotation_ids.insert(ann.id) {
                return Err(format!("duplicate annotation id {}", ann.id));
            }
            if !image_ids.contains(&ann.image_id) {
                return Err(format!(
                    "annotation {} references unknown image {}",
                    ann.id, ann.image_id
                ));
            }
            if !category_ids.contains(&ann.category_id) {
                return Err(format!(
                    "annotation {} references unknown category {}",
                    ann.id, ann.category_id
                ));
            }
        }

        Ok(())
    }

    /// Serialize the corpus to `path`, creating missing parent directories.
    pub fn save(&self, path: &Path, pretty: bool) -> Result<()> {
        let write_error = |source: std::io::Error| ConvertError::OutputWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut writer = BufWriter::new(File::create(path).map_err(write_error)?);
        let serialized = if pretty {
            serde_json::to_writer_pretty(&mut writer, self)
        } else {
            serde_json::to_writer(&mut writer, self)
        };
        serialized.map_err(|e| write_error(e.into()))?;
        writer.flush().map_err(write_error)
    }
}

/// Geometry derived from the raw points of one shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGeometry {
    /// `[x_min, y_min, width, height]`
    pub bbox: [f64; 4],
    /// Bounding-box area, not the true polygon area.
    pub area: f64,
    /// Points flattened as `[x1, y1, x2, y2, ...]` in input order.
    pub polygon: Vec<f64>,
}

/// Derive the axis-aligned bounding box, its area and the flattened polygon
/// from a point list. Returns `None` for an empty list.
///
/// The area is `width * height` of the bounding box. Consumers of existing
/// corpora depend on this convention, so do not replace it with the shoelace
/// area.
pub fn calculate_shape_geometry(points: &[(f64, f64)]) -> Option<ShapeGeometry> {
    if points.is_empty() {
        return None;
    }

    let (min_x, min_y, max_x, max_y) = points.iter().fold(
        (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
        |(min_x, min_y, max_x, max_y), &(x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        },
    );

    let width = max_x - min_x;
    let height = max_y - min_y;
    let polygon = points.iter().flat_map(|&(x, y)| [x, y]).collect();

    Some(ShapeGeometry {
        bbox: [min_x, min_y, width, height],
        area: width * height,
        polygon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_geometry() {
        let geometry =
            calculate_shape_geometry(&[(10.0, 10.0), (10.0, 20.0), (20.0, 20.0), (20.0, 10.0)])
                .unwrap();
        assert_eq!(geometry.bbox, [10.0, 10.0, 10.0, 10.0]);
        assert_eq!(geometry.area, 100.0);
        assert_eq!(
            geometry.polygon,
            vec![10.0, 10.0, 10.0, 20.0, 20.0, 20.0, 20.0, 10.0]
        );
    }

    #[test]
    fn test_area_is_bbox_area_not_polygon_area() {
        // A right triangle covers half its bounding box.
        let geometry = calculate_shape_geometry(&[(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)]).unwrap();
        assert_eq!(geometry.bbox, [0.0, 0.0, 4.0, 3.0]);
        assert_eq!(geometry.area, 12.0);
    }

    #[test]
    fn test_single_point_and_negative_coords() {
        let geometry = calculate_shape_geometry(&[(-5.5, 2.0)]).unwrap();
        assert_eq!(geometry.bbox, [-5.5, 2.0, 0.0, 0.0]);
        assert_eq!(geometry.area, 0.0);

        let geometry = calculate_shape_geometry(&[(-3.0, -1.0), (1.0, 4.0)]).unwrap();
        assert_eq!(geometry.bbox, [-3.0, -1.0, 4.0, 5.0]);
        assert_eq!(geometry.area, 20.0);
    }

    #[test]
    fn test_empty_points() {
        assert!(calculate_shape_geometry(&[]).is_none());
    }

    #[test]
    fn test_area_matches_bbox_for_many_shapes() {
        let shapes: Vec<Vec<(f64, f64)>> = vec![
            vec![(1.0, 1.0), (7.5, 3.25), (2.0, 9.0)],
            vec![(100.0, 50.0), (90.0, 60.0), (95.5, 40.0), (120.0, 55.0)],
            vec![(0.0, 0.0), (0.0, 0.0)],
        ];
        for points in shapes {
            let g = calculate_shape_geometry(&points).unwrap();
            assert!(g.bbox[2] >= 0.0 && g.bbox[3] >= 0.0);
            assert_eq!(g.area, g.bbox[2] * g.bbox[3]);
            assert!(g.area >= 0.0);
        }
    }

    fn sample_corpus() -> CocoFile {
        CocoFile {
            images: vec![Image::new(1, "videos/VID01/000001.png".to_string(), 100, 100)],
            annotations: vec![Annotation {
                id: 1,
                image_id: 1,
                category_id: 1,
                segmentation: vec![vec![0.0, 0.0, 1.0, 1.0]],
                bbox: [0.0, 0.0, 1.0, 1.0],
                area: 1.0,
                iscrowd: 0,
                extra: Map::new(),
            }],
            categories: vec![Category::new(1, "grasper".to_string())],
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(sample_corpus()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(value["images"][0].as_object().unwrap().len(), 4);
        assert_eq!(value["annotations"][0].as_object().unwrap().len(), 7);
        assert_eq!(value["categories"][0].as_object().unwrap().len(), 2);

        let ann = &value["annotations"][0];
        assert_eq!(ann["iscrowd"], 0);
        assert_eq!(ann["segmentation"][0].as_array().unwrap().len(), 4);
        assert_eq!(ann["bbox"].as_array().unwrap().len(), 4);
        assert_eq!(value["images"][0]["file_name"], "videos/VID01/000001.png");
        assert_eq!(value["categories"][0]["name"], "grasper");
    }

    #[test]
    fn test_unmodelled_fields_survive_load_and_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("instances.json");
        let doc = serde_json::json!({
            "info": {"year": 2024},
            "images": [{"id": 1, "file_name": "a.png", "height": 4, "width": 6,
                        "license": 2, "coco_url": "http://example.com/a.png"}],
            "annotations": [{"id": 3, "image_id": 1, "category_id": 1,
                             "segmentation": [[0, 0, 1, 1]], "bbox": [0, 0, 1, 1],
                             "area": 1, "iscrowd": 0, "score": 0.5}],
            "categories": [{"id": 1, "name": "grasper", "supercategory": "instrument"}]
        });
        fs::write(&input, doc.to_string()).unwrap();

        let coco = CocoFile::load(&input).unwrap();
        assert_eq!(coco.categories[0].extra["supercategory"], "instrument");
        assert_eq!(coco.images[0].extra["license"], 2);
        assert_eq!(coco.annotations[0].extra["score"], 0.5);
        assert_eq!(coco.annotations[0].bbox, [0.0, 0.0, 1.0, 1.0]);

        let output = temp_dir.path().join("copy.json");
        coco.save(&output, false).unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["images"], doc["images"]);
        assert_eq!(written["categories"], doc["categories"]);
        assert_eq!(written["annotations"][0]["score"], 0.5);
    }

    #[test]
    fn test_validate_rejects_dangling_references() {
        let mut coco = sample_corpus();
        assert!(coco.validate().is_ok());

        coco.annotations[0].image_id = 7;
        assert!(coco.validate().unwrap_err().contains("unknown image 7"));

        let mut coco = sample_corpus();
        coco.annotations[0].category_id = 3;
        assert!(coco.validate().unwrap_err().contains("unknown category 3"));

        let mut coco = sample_corpus();
        coco.images.push(coco.images[0].clone());
        assert!(coco.validate().unwrap_err().contains("duplicate image id"));
    }

    #[test]
    fn test_save_creates_parent_dirs_and_loads_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/annotations/train_coco.json");

        sample_corpus().save(&path, false).unwrap();
        let loaded = CocoFile::load(&path).unwrap();
        assert_eq!(loaded, sample_corpus());
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            CocoFile::load(&missing),
            Err(ConvertError::CorpusLoad { .. })
        ));

        let malformed = temp_dir.path().join("bad.json");
        fs::write(&malformed, r#"{"images": [], "annotations": 3}"#).unwrap();
        assert!(matches!(
            CocoFile::load(&malformed),
            Err(ConvertError::CorpusLoad { .. })
        ));
    }
}
