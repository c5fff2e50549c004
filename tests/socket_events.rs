// Socket message handling, exercised without a live connection

mod common;

use serde_json::Value;

use common::*;
use emotion_service::server::{handle_audio_data, handle_text_frame};

const STREAM_RATE: u32 = 44100;

fn to_json<T: serde::Serialize>(event: &T) -> Value {
    serde_json::to_value(event).unwrap()
}

#[test]
fn test_audio_data_returns_emotion_result() {
    let analyzer = analyzer(SoftmaxHead);
    let bytes = f32le_bytes(&sine(220.0, STREAM_RATE, 0.5));

    let json = to_json(&handle_audio_data(&analyzer, &bytes, STREAM_RATE));

    assert_eq!(json["event"], "emotion_result");
    assert_eq!(json["data"]["probabilities"].as_object().unwrap().len(), 4);
    let detected = json["data"]["detected_emotion"].as_str().unwrap();
    assert!(["Angry", "Happy", "Neutral", "Sad"].contains(&detected));
}

#[test]
fn test_audio_data_misaligned_buffer() {
    let analyzer = analyzer(SoftmaxHead);
    let mut bytes = f32le_bytes(&sine(220.0, STREAM_RATE, 0.1));
    bytes.push(0);

    let json = to_json(&handle_audio_data(&analyzer, &bytes, STREAM_RATE));

    assert_eq!(json["event"], "error");
    assert!(json["data"]["message"]
        .as_str()
        .unwrap()
        .contains("multiple of 4"));
}

#[test]
fn test_audio_data_empty_buffer() {
    let analyzer = analyzer(SoftmaxHead);

    let json = to_json(&handle_audio_data(&analyzer, &[], STREAM_RATE));

    assert_eq!(json["event"], "error");
}

#[test]
fn test_audio_data_inference_failure_becomes_error_event() {
    let analyzer = analyzer(FailingClassifier);
    let bytes = f32le_bytes(&sine(220.0, STREAM_RATE, 0.2));

    let json = to_json(&handle_audio_data(&analyzer, &bytes, STREAM_RATE));

    assert_eq!(json["event"], "error");
    assert!(json["data"]["message"]
        .as_str()
        .unwrap()
        .contains("runtime unavailable"));
}

#[test]
fn test_audio_data_uses_fixed_classifier_output() {
    let analyzer = analyzer(FixedClassifier(vec![0.7, 0.1, 0.1, 0.1]));
    let bytes = f32le_bytes(&sine(220.0, STREAM_RATE, 0.2));

    let json = to_json(&handle_audio_data(&analyzer, &bytes, STREAM_RATE));

    assert_eq!(json["data"]["detected_emotion"], "Angry");
}

#[test]
fn test_text_frame_matches_binary_frame() {
    let analyzer = analyzer(SoftmaxHead);
    let samples = sine(330.0, STREAM_RATE, 0.25);

    let text = serde_json::json!({ "event": "audio_data", "data": samples }).to_string();
    let from_text = to_json(&handle_text_frame(&analyzer, &text, STREAM_RATE));
    let from_binary = to_json(&handle_audio_data(&analyzer, &f32le_bytes(&samples), STREAM_RATE));

    assert_eq!(from_text["event"], "emotion_result");
    assert_eq!(from_text, from_binary);
}

#[test]
fn test_text_frame_unknown_event() {
    let analyzer = analyzer(SoftmaxHead);

    let json = to_json(&handle_text_frame(
        &analyzer,
        r#"{"event": "subscribe", "data": {}}"#,
        STREAM_RATE,
    ));

    assert_eq!(json["event"], "error");
    assert!(json["data"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid event"));
}

#[test]
fn test_text_frame_not_json() {
    let analyzer = analyzer(SoftmaxHead);

    let json = to_json(&handle_text_frame(&analyzer, "hello", STREAM_RATE));

    assert_eq!(json["event"], "error");
}

#[test]
fn test_audio_data_is_deterministic() {
    let analyzer = analyzer(SoftmaxHead);
    let bytes = f32le_bytes(&sine(500.0, STREAM_RATE, 0.3));

    let first = to_json(&handle_audio_data(&analyzer, &bytes, STREAM_RATE));
    let second = to_json(&handle_audio_data(&analyzer, &bytes, STREAM_RATE));

    assert_eq!(first, second);
}
