use exam_insight::{AnalyticsError, InsightProcessor, SnapshotAdapter};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

/// (question, chapter, concept, difficulty, question type)
const QUESTIONS: [(u64, u64, u64, &str, &str); 4] = [
    (1, 1, 10, "easy", "mcq"),
    (2, 1, 10, "medium", "mcq"),
    (3, 2, 11, "hard", "coding"),
    (4, 2, 11, "medium", "mcq"),
];

/// Questions answered correctly by each student
const CORRECT: [(u64, &[u64]); 4] = [(1, &[1, 2, 3, 4]), (2, &[1, 2, 4]), (3, &[1]), (4, &[])];

fn course_stream() -> String {
    let submitted_at = "2024-03-04T10:00:00Z";
    let mut records = vec![
        json!({"record_type": "course", "course_id": 1, "schema_version": "exam.snapshot_record.v1"}),
        json!({"record_type": "chapter", "id": 1, "name": "Arithmetic", "sequence_order": 1}),
        json!({"record_type": "chapter", "id": 2, "name": "Algebra", "sequence_order": 2, "prerequisites": [1]}),
        json!({"record_type": "concept", "id": 10, "name": "Fractions", "chapter_id": 1}),
        json!({"record_type": "concept", "id": 11, "name": "Equations", "chapter_id": 2, "prerequisites": [10]}),
    ];

    for (student_id, correct) in CORRECT {
        records.push(json!({"record_type": "student", "id": student_id, "name": format!("Student {}", student_id)}));
        records.push(json!({
            "record_type": "attempt",
            "attempt_id": student_id,
            "student_id": student_id,
            "exam_id": 100,
            "percentage": correct.len() as f64 / 4.0 * 100.0,
            "submitted_at": submitted_at,
        }));
        for (question_id, chapter_id, concept_id, difficulty, question_type) in QUESTIONS {
            let is_correct = correct.contains(&question_id);
            let selected_option_id = if is_correct { 1 } else { 2 };
            records.push(json!({
                "record_type": "answer",
                "attempt_id": student_id,
                "student_id": student_id,
                "exam_id": 100,
                "question_id": question_id,
                "is_correct": is_correct,
                "chapter_id": chapter_id,
                "concept_ids": [concept_id],
                "difficulty": difficulty,
                "question_type": question_type,
                "selected_option_id": selected_option_id,
                "submitted_at": submitted_at,
            }));
        }
    }

    // References a chapter that does not exist; dropped before analysis
    records.push(json!({
        "record_type": "answer",
        "attempt_id": 1, "student_id": 1, "exam_id": 100, "question_id": 5,
        "is_correct": true, "chapter_id": 99, "difficulty": "easy",
        "submitted_at": submitted_at,
    }));

    records
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn student_report_from_stream() {
    let processor = InsightProcessor::new();
    let report = processor.student_report_from_json(&course_stream(), 3).unwrap();
    let value: Value = serde_json::from_str(&report).unwrap();

    assert_eq!(value["course_id"], 1);
    assert_eq!(value["student_id"], 3);
    assert_eq!(value["producer"]["name"], "exam-insight");
    assert_eq!(value["chapters"]["overall_accuracy"], 25.0);
    assert_eq!(value["grade"], "F");

    // Algebra at 0% sits on a weak Arithmetic (50%)
    let gaps = &value["learning_gaps"];
    assert_eq!(gaps["total_gaps"], 1);
    assert_eq!(gaps["gaps"][0]["gap_type"], "foundational");
    assert_eq!(gaps["gaps"][0]["prerequisite_name"], "Arithmetic");
    assert_eq!(gaps["priority_order"][0], gaps["gaps"][0]["gap_id"]);

    assert_eq!(value["standing"]["rank"], 3);
}

#[test]
fn class_report_for_exam() {
    let processor = InsightProcessor::new();
    let report = processor
        .class_report_from_json(&course_stream(), Some(100))
        .unwrap();
    let value: Value = serde_json::from_str(&report).unwrap();

    let statistics = &value["statistics"];
    assert_eq!(statistics["total_students"], 4);
    assert_eq!(statistics["submitted_count"], 4);
    assert_eq!(statistics["mean_score"], 50.0);
    assert_eq!(statistics["pass_rate"], 50.0);

    // The answer to the unknown chapter never reaches item analysis
    let items = value["item_analysis"].as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["question_id"], 1);

    let alert_kinds: Vec<&str> = value["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["kind"].as_str())
        .collect();
    assert!(alert_kinds.contains(&"low_pass_rate"));
    assert!(!alert_kinds.contains(&"on_track"));
}

#[test]
fn document_and_stream_give_the_same_snapshot() {
    let from_stream = SnapshotAdapter::parse(&course_stream()).unwrap();
    let document = serde_json::to_string(&from_stream).unwrap();
    let from_document = SnapshotAdapter::parse(&document).unwrap();

    assert_eq!(from_stream, from_document);
    assert_eq!(SnapshotAdapter::validate_snapshot(&from_document).len(), 1);
}

#[test]
fn malformed_input_is_an_error() {
    let processor = InsightProcessor::new();

    assert!(matches!(
        processor.student_report_from_json("{not json", 1),
        Err(AnalyticsError::ParseError(_))
    ));
    assert!(matches!(
        processor.class_report_from_json(r#"[{"record_type":"student","id":1,"name":"A"}]"#, None),
        Err(AnalyticsError::MissingField(_))
    ));
}
