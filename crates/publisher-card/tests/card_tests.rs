//! End-to-end card generation tests
//!
//! A full card template is built in memory with every field the generator
//! writes: identity texts, the nine identity checkboxes and the five table
//! columns for each of the twelve months.

use form_core::encode_pdf_text;
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use pretty_assertions::assert_eq;
use publisher_card::{
    CachedProvider, CardError, CardGenerator, CardResources, FieldMap, MonthlyRecord,
    ResourceProvider, ServiceMonth, UserInfo, YearlyRecord,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const TEST_FONT: &str = "../../fonts/DejaVuSans.ttf";

const STATIC_TEXTS: [&str; 6] = [
    "성명",
    "생년월일",
    "침례 일자",
    "봉사 연도",
    "총계 시간",
    "총계 비고",
];
const STATIC_CHECKBOXES: [&str; 9] = [
    "남",
    "여",
    "다른 양",
    "기름부음받은 자",
    "장로",
    "봉사의 종",
    "정규 파이오니아",
    "특별 파이오니아",
    "야외 선교인",
];
const MONTH_TEXT_SUFFIXES: [&str; 3] = ["성서 연구", "시간", "비고"];
const MONTH_CHECKBOX_SUFFIXES: [&str; 2] = ["봉사에 참여했음", "보조 파이오니아"];

fn build_template() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut annots = Vec::new();
    let mut y = 820.0f32;

    let mut next_rect = |width: f32| {
        y -= 14.0;
        vec![
            Object::Real(40.0),
            Object::Real(y),
            Object::Real(40.0 + width),
            Object::Real(y + 12.0),
        ]
    };

    let mut text_names: Vec<String> = STATIC_TEXTS.iter().map(|s| s.to_string()).collect();
    let mut checkbox_names: Vec<String> =
        STATIC_CHECKBOXES.iter().map(|s| s.to_string()).collect();
    for month in ServiceMonth::ALL {
        for suffix in MONTH_TEXT_SUFFIXES {
            text_names.push(format!("{} {suffix}", month.label()));
        }
        for suffix in MONTH_CHECKBOX_SUFFIXES {
            checkbox_names.push(format!("{} {suffix}", month.label()));
        }
    }

    for name in &text_names {
        let id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::String(encode_pdf_text(name), StringFormat::Hexadecimal),
            "Rect" => next_rect(120.0),
        });
        annots.push(Object::Reference(id));
    }

    for name in &checkbox_names {
        let on_stream = doc.add_object(Stream::new(
            dictionary! { "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()] },
            b"0 0 10 10 re f".to_vec(),
        ));
        let off_stream = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::String(encode_pdf_text(name), StringFormat::Hexadecimal),
            "Rect" => next_rect(10.0),
            "AS" => "Off",
            "AP" => dictionary! {
                "N" => dictionary! {
                    "1" => Object::Reference(on_stream),
                    "Off" => Object::Reference(off_stream),
                },
            },
        });
        annots.push(Object::Reference(id));
    }

    let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => Dictionary::new(),
        "Annots" => annots.clone(),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => dictionary! { "Fields" => annots },
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

struct TestProvider {
    field_map: FieldMap,
    loads: AtomicUsize,
}

impl TestProvider {
    fn new() -> Self {
        Self {
            field_map: FieldMap::default(),
            loads: AtomicUsize::new(0),
        }
    }

    fn with_map(field_map: FieldMap) -> Self {
        Self {
            field_map,
            loads: AtomicUsize::new(0),
        }
    }
}

impl ResourceProvider for TestProvider {
    fn load(&self) -> publisher_card::Result<Arc<CardResources>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(CardResources {
            template: build_template(),
            font: std::fs::read(TEST_FONT).expect("test font fixture"),
            field_map: self.field_map.clone(),
        }))
    }
}

fn sample_record() -> YearlyRecord {
    YearlyRecord {
        user_info: UserInfo {
            name: "홍길동".to_string(),
            birth_date: "1990-01-01".to_string(),
            baptism_date: "2010-05-05".to_string(),
            is_elder: true,
            ..UserInfo::default()
        },
        monthly_records: vec![
            MonthlyRecord {
                month: Some(ServiceMonth::September),
                participated: true,
                bible_studies: 2,
                hours: 50,
                remarks: "병교위: 3시간".to_string(),
                ..MonthlyRecord::default()
            },
            MonthlyRecord {
                month: Some(ServiceMonth::October),
                participated: true,
                hours: 42,
                ..MonthlyRecord::default()
            },
        ],
    }
}

fn page_content(data: &[u8]) -> String {
    let doc = Document::load_mem(data).unwrap();
    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let content_id = page.get(b"Contents").unwrap().as_reference().unwrap();
    match doc.get_object(content_id).unwrap() {
        Object::Stream(stream) => String::from_utf8_lossy(&stream.content).to_string(),
        other => panic!("unexpected Contents: {other:?}"),
    }
}

#[test]
fn test_generated_card_is_flattened_but_still_drawn() {
    let generator = CardGenerator::new(TestProvider::new());
    let card = generator
        .generate_publisher_card(&sample_record(), "2025-2026 봉사 연도")
        .unwrap();

    let doc = Document::load_mem(&card).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    // No interactive fields survive flattening
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_object(root).unwrap().as_dict().unwrap();
    let acroform = catalog.get(b"AcroForm").unwrap().as_reference().unwrap();
    let acroform = doc.get_object(acroform).unwrap().as_dict().unwrap();
    assert!(acroform.get(b"Fields").unwrap().as_array().unwrap().is_empty());

    let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    assert!(page.get(b"Annots").unwrap().as_array().unwrap().is_empty());

    // The written values were drawn into static content
    let content = page_content(&card);
    assert!(content.contains("/CardFont"));
    assert!(content.contains("Tj"));
}

#[test]
fn test_missing_field_mapping_fails_without_output() {
    let map = FieldMap::from_json(r#"{ "name": "성명" }"#.as_bytes()).unwrap();
    let generator = CardGenerator::new(TestProvider::with_map(map));
    let err = generator
        .generate_publisher_card(&sample_record(), "2025-2026")
        .unwrap_err();
    assert!(matches!(err, CardError::UnknownField(key) if key == "birthDate"));
}

#[test]
fn test_missing_template_field_fails() {
    // The map points the name key at a field the template does not carry
    let map = FieldMap::from_json(
        r#"{
            "name": "존재하지 않음",
            "birthDate": "생년월일", "baptismDate": "침례 일자",
            "genderMale": "남", "genderFemale": "여",
            "hopeOtherSheep": "다른 양", "hopeAnointed": "기름부음받은 자",
            "elder": "장로", "ministerialServant": "봉사의 종",
            "regularPioneer": "정규 파이오니아", "specialPioneer": "특별 파이오니아",
            "missionary": "야외 선교인", "serviceYear": "봉사 연도",
            "totalHours": "총계 시간", "totalRemarks": "총계 비고"
        }"#
        .as_bytes(),
    )
    .unwrap();

    let generator = CardGenerator::new(TestProvider::with_map(map));
    let err = generator
        .generate_publisher_card(&sample_record(), "2025-2026")
        .unwrap_err();
    assert!(matches!(
        err,
        CardError::Form(form_core::FormError::FieldNotFound(_))
    ));
}

#[test]
fn test_only_requested_checkboxes_are_stamped() {
    // Elder plus two participation months checked: exactly three stamps
    let generator = CardGenerator::new(TestProvider::new());
    let card = generator
        .generate_publisher_card(&sample_record(), "2025-2026")
        .unwrap();

    let content = page_content(&card);
    let stamps = content.matches("/Fq").count();
    assert_eq!(stamps, 3);
}

#[test]
fn test_resource_cache_fetches_once_across_generations() {
    let inner = Arc::new(TestProvider::new());
    let generator = CardGenerator::new(CachedProvider::new(Arc::clone(&inner)));

    generator
        .generate_publisher_card(&sample_record(), "2025-2026")
        .unwrap();
    let mut second = sample_record();
    second.user_info.name = "김철수".to_string();
    generator
        .generate_publisher_card(&second, "2025-2026")
        .unwrap();

    assert_eq!(inner.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_merge_cards_page_count() {
    let generator = CardGenerator::new(TestProvider::new());
    let one = generator
        .generate_publisher_card(&sample_record(), "2025-2026")
        .unwrap();
    let two = generator
        .generate_publisher_card(&sample_record(), "2025-2026")
        .unwrap();

    let merged = generator.merge_cards(&[one, two]).unwrap();
    let doc = Document::load_mem(&merged).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    let empty = generator.merge_cards(&[]).unwrap();
    let doc = Document::load_mem(&empty).unwrap();
    assert_eq!(doc.get_pages().len(), 0);
}
