//! Demo dataset: the institutions and sample courses the dashboards ship
//! with. Never loaded implicitly; call [`seed_demo_data`] from tests or a
//! demo harness.

use crate::error::Result;
use crate::store::DocumentStore;
use crate::types::{CollectionName, Document};
use serde_json::json;

/// Load the demo institutions and courses under their fixed ids.
/// Idempotent: re-seeding merges over the existing documents.
pub fn seed_demo_data(store: &DocumentStore) -> Result<()> {
    for (id, doc) in demo_institutions() {
        store.upsert(CollectionName::Institutions, &id, doc)?;
    }
    for (id, doc) in demo_courses() {
        store.upsert(CollectionName::Courses, &id, doc)?;
    }
    Ok(())
}

fn fields(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => unreachable!("seed entries are objects"),
    }
}

fn demo_institutions() -> Vec<(String, Document)> {
    let entries = [
        json!({
            "id": "inst1",
            "name": "Makerere University",
            "description": "A premier institution of higher learning, offering a wide range of undergraduate and postgraduate courses.",
            "address": "Kampala, Uganda",
            "phone": "+256-414-532-752",
            "email": "info@mak.ac.ug",
            "staffCount": 85,
            "price": 1200,
            "priceType": "yearly",
        }),
        json!({
            "id": "inst2",
            "name": "St. Mary's College Kisubi",
            "description": "A leading secondary school known for excellence in sciences and holistic education for boys.",
            "address": "Wakiso, Uganda",
            "phone": "+256-312-350-880",
            "email": "info@smack.ac.ug",
            "staffCount": 60,
            "price": 150,
            "priceType": "monthly",
        }),
        json!({
            "id": "inst3",
            "name": "King's College Budo",
            "description": "One of the oldest and most prestigious mixed secondary schools in Uganda, with a strong tradition in leadership.",
            "address": "Wakiso, Uganda",
            "phone": "+256-414-286-161",
            "email": "info@kcb.ac.ug",
            "staffCount": 65,
            "price": 165,
            "priceType": "monthly",
        }),
        json!({
            "id": "inst4",
            "name": "Gayaza High School",
            "description": "The oldest all-girls school in Uganda, championing female education and empowerment.",
            "address": "Wakiso, Uganda",
            "phone": "+256-772-420-330",
            "email": "info@gayaza.ac.ug",
            "staffCount": 55,
            "price": 145,
            "priceType": "monthly",
        }),
        json!({
            "id": "inst5",
            "name": "Kyambogo University",
            "description": "A public university known for teacher education, vocational studies, and special needs education.",
            "address": "Kampala, Uganda",
            "phone": "+256-414-286-161",
            "email": "info@kyu.ac.ug",
            "staffCount": 70,
            "price": 1100,
            "priceType": "yearly",
        }),
        json!({
            "id": "inst6",
            "name": "Mbarara University",
            "description": "A leading science and technology university with a strong focus on health sciences and research.",
            "address": "Mbarara, Uganda",
            "phone": "+256-485-420-330",
            "email": "info@must.ac.ug",
            "staffCount": 50,
            "price": 1300,
            "priceType": "yearly",
        }),
        json!({
            "id": "inst7",
            "name": "OIT",
            "description": "A hub for innovation and technology, offering practical skills in IT, business, and public health in Northern Uganda.",
            "address": "Gulu, Uganda",
            "phone": "+256-471-420-330",
            "email": "info@oit.ac.ug",
            "staffCount": 60,
            "price": 0,
            "priceType": "free",
        }),
    ];

    entries.into_iter().map(with_id).collect()
}

fn demo_courses() -> Vec<(String, Document)> {
    let entries = [
        json!({
            "id": "course1",
            "title": "Introduction to Agriculture in Uganda",
            "description": "Learn about modern farming techniques, crop management, and agricultural practices specific to Uganda's climate and soil conditions.",
            "instructorId": "sample-instructor-1",
            "instructorName": "Dr. Nakato Mary",
        }),
        json!({
            "id": "course2",
            "title": "Luganda Language and Culture",
            "description": "Master the Luganda language and understand Ugandan cultural traditions, customs, and heritage.",
            "instructorId": "sample-instructor-2",
            "instructorName": "Prof. Kigozi James",
        }),
        json!({
            "id": "course3",
            "title": "Entrepreneurship in East Africa",
            "description": "Develop business skills and learn about the East African market, with focus on Uganda's business environment.",
            "instructorId": "sample-instructor-3",
            "instructorName": "Ms. Namukasa Sarah",
        }),
    ];

    entries.into_iter().map(with_id).collect()
}

fn with_id(value: serde_json::Value) -> (String, Document) {
    let doc = fields(value);
    let id = doc["id"].as_str().expect("seed ids are strings").to_string();
    (id, doc)
}
