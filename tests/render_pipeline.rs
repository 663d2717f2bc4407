mod support;

use mathcast::{
    application::render::{ArtifactBody, RenderError, RenderRequest, ResponsePayload},
    domain::capabilities::{Capabilities, SpeechConfig},
};
use mathcast_api_types::Features;
use support::{Calls, Harness, OPTIMIZED_SVG, PNG_BYTES, SPOKEN};

fn artifact_text(payload: ResponsePayload) -> String {
    match payload {
        ResponsePayload::Artifact {
            body: ArtifactBody::Text(text),
            ..
        } => text,
        other => panic!("expected a text artifact, got {other:?}"),
    }
}

#[tokio::test]
async fn svg_request_returns_vector_without_raster() {
    let harness = Harness::default();
    let payload = harness
        .service
        .render(RenderRequest::new("x^2").with_output_format("svg"))
        .await
        .expect("rendered");

    let headers = payload.headers();
    assert!(headers.contains(&("content-type", "image/svg+xml".to_string())));
    let svg = artifact_text(payload);
    assert!(svg.starts_with("<svg"), "{svg}");
    assert_eq!(Calls::get(&harness.calls.rasterize), 0);
}

#[tokio::test]
async fn json_output_carries_every_artifact() {
    let harness = Harness::default();
    let payload = harness
        .service
        .render(RenderRequest::new("x^2").with_features(Features { speech: false }))
        .await
        .expect("rendered");

    let value = payload.to_json();
    assert_eq!(value["success"], true);
    assert_eq!(value["log"], "success");
    assert_eq!(value["sanetex"], "x^2");
    assert!(value["svg"].as_str().expect("svg").starts_with("<svg"));
    assert!(value["mml"].as_str().expect("mml").contains("<math"));
    assert_eq!(
        value["mathStyle"],
        "vertical-align: -0.1ex; width:2ex; height:1ex;"
    );
    assert!(value["png"].is_string());
    assert!(value.get("speech").is_none());
    assert_eq!(Calls::get(&harness.calls.speak), 0);
}

#[tokio::test]
async fn invalid_tex_never_reaches_an_engine() {
    let harness = Harness::default();
    let err = harness
        .service
        .render(RenderRequest::new("\\badcmd{x}").with_output_format("svg"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation_failed");
    let envelope = err.envelope();
    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.error, "SyntaxError: Illegal TeX function");
    assert_eq!(
        envelope.feedback.expect("feedback")["error"]["found"],
        "\\badcmd"
    );
    assert_eq!(Calls::get(&harness.calls.feedback), 1);
    assert_eq!(harness.calls.engine_calls(), 0);
}

#[tokio::test]
async fn disabled_svg_names_the_flag() {
    let harness = Harness::new(Capabilities {
        svg: false,
        ..Capabilities::default()
    });
    let err = harness
        .service
        .render(RenderRequest::new("x").with_output_format("svg"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "format_disabled");
    assert!(err.to_string().contains("svg: true"), "{err}");
    assert_eq!(Calls::get(&harness.calls.feedback), 0);
}

#[tokio::test]
async fn empty_query_is_rejected_first() {
    let harness = Harness::default();
    let err = harness
        .service
        .render(RenderRequest::new("").with_output_format("bogus"))
        .await
        .unwrap_err();

    assert!(matches!(err, RenderError::MissingQuery));
}

#[tokio::test]
async fn unknown_aliases_are_reported() {
    let harness = Harness::default();

    let err = harness
        .service
        .render(RenderRequest::new("x").with_input_type("latex"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Input format \"latex\" is not recognized!");

    let err = harness
        .service
        .render(RenderRequest::new("x").with_output_format("gif"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unrecognized_format");
}

#[tokio::test]
async fn speech_on_mathml_input() {
    let harness = Harness::default();
    let payload = harness
        .service
        .render(
            RenderRequest::new("<math><mi>x</mi></math>")
                .with_input_type("mml")
                .with_output_format("speech"),
        )
        .await
        .expect("rendered");

    assert_eq!(artifact_text(payload), SPOKEN);
    assert_eq!(Calls::get(&harness.calls.feedback), 0);
    assert_eq!(Calls::get(&harness.calls.rasterize), 0);
}

#[tokio::test]
async fn speech_annotates_every_node() {
    let harness = Harness::new(Capabilities {
        img: true,
        speech_config: SpeechConfig {
            semantic: true,
            ..SpeechConfig::default()
        },
        ..Capabilities::default()
    });
    let value = harness
        .service
        .render(RenderRequest::new("x^2").with_features(Features { speech: true }))
        .await
        .expect("rendered")
        .to_json();

    assert_eq!(value["speech"], SPOKEN);
    assert_eq!(value["speakText"], SPOKEN);
    assert!(
        value["svg"]
            .as_str()
            .expect("svg")
            .contains(&format!("<title>{SPOKEN}</title>"))
    );
    assert!(
        value["mml"]
            .as_str()
            .expect("mml")
            .contains(&format!("alttext=\"{SPOKEN}\""))
    );
    assert!(
        value["html"]
            .as_str()
            .expect("aux")
            .contains(&format!("aria-label=\"{SPOKEN}\""))
    );
    assert_eq!(value["streeJson"]["stree"]["type"], "superscript");
    assert_eq!(value["streeXml"], "<stree><superscript/></stree>");
}

#[tokio::test]
async fn png_never_produces_speech() {
    let harness = Harness::default();
    let payload = harness
        .service
        .render(
            RenderRequest::new("x")
                .with_output_format("png")
                .with_features(Features { speech: true }),
        )
        .await
        .expect("rendered");

    match payload {
        ResponsePayload::Artifact {
            body: ArtifactBody::Binary(bytes),
            ..
        } => assert_eq!(bytes, PNG_BYTES),
        other => panic!("expected png artifact, got {other:?}"),
    }
    assert_eq!(Calls::get(&harness.calls.speak), 0);
}

#[tokio::test]
async fn raster_failure_stops_before_speech() {
    let harness = Harness::default();
    harness.fail_rasterizer();

    let err = harness
        .service
        .render(RenderRequest::new("x").with_features(Features { speech: true }))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "rasterization_failed");
    assert_eq!(Calls::get(&harness.calls.rasterize), 1);
    assert_eq!(Calls::get(&harness.calls.speak), 0);
}

#[tokio::test]
async fn optimizer_failure_keeps_the_svg() {
    let harness = Harness::new(Capabilities {
        svgo: true,
        ..Capabilities::default()
    });
    harness.fail_optimizer();

    let svg = artifact_text(
        harness
            .service
            .render(RenderRequest::new("x").with_output_format("svg"))
            .await
            .expect("rendered"),
    );
    assert!(svg.contains("viewBox"), "{svg}");
    assert_eq!(Calls::get(&harness.calls.optimize), 1);
}

#[tokio::test]
async fn optimizer_output_replaces_the_svg() {
    let harness = Harness::new(Capabilities {
        svgo: true,
        ..Capabilities::default()
    });
    let svg = artifact_text(
        harness
            .service
            .render(RenderRequest::new("x").with_output_format("svg"))
            .await
            .expect("rendered"),
    );
    assert_eq!(svg, OPTIMIZED_SVG);
}

#[tokio::test]
async fn info_report_skips_typesetting() {
    let harness = Harness::new(Capabilities {
        no_check: true,
        ..Capabilities::default()
    });
    let payload = harness
        .service
        .render(RenderRequest::new("x+1").with_output_format("texvcinfo"))
        .await
        .expect("rendered");

    assert!(
        payload
            .headers()
            .contains(&("cache-control", "max-age=2592000".to_string()))
    );
    let value = payload.to_json();
    assert_eq!(value["success"], true);
    assert_eq!(value["checked"], "x+1");
    assert_eq!(harness.calls.engine_calls(), 0);
}

#[tokio::test]
async fn graph_returns_the_parse_tree() {
    let harness = Harness::default();
    let payload = harness
        .service
        .render(RenderRequest::new(" a+b ").with_output_format("graph"))
        .await
        .expect("rendered");

    assert!(matches!(payload, ResponsePayload::Graph(_)));
    assert_eq!(payload.to_json()["input"], "a+b");
    assert_eq!(Calls::get(&harness.calls.parse_tree), 1);
    assert_eq!(harness.calls.engine_calls(), 0);
}

#[tokio::test]
async fn graph_rejects_chemistry() {
    let harness = Harness::default();
    let err = harness
        .service
        .render(
            RenderRequest::new("H2O")
                .with_input_type("chem")
                .with_output_format("graph"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "type_mismatch");
    assert_eq!(
        err.to_string(),
        "graph accepts only tex or inline-tex as the input type, \"chem\" given!"
    );
}

#[tokio::test]
async fn chemistry_is_typeset_from_the_sanitized_form() {
    let harness = Harness::default();
    let value = harness
        .service
        .render(
            RenderRequest::new("H2O")
                .with_input_type("chem")
                .with_features(Features { speech: false }),
        )
        .await
        .expect("rendered")
        .to_json();

    assert_eq!(value["sanetex"], "{\\ce{H2O}}");
    assert!(value["mml"].as_str().expect("mml").contains("\\ce{H2O}"));
}

#[tokio::test]
async fn complete_wraps_artifacts_with_headers() {
    let harness = Harness::default();
    let value = harness
        .service
        .render(
            RenderRequest::new("x")
                .with_output_format("complete")
                .with_features(Features { speech: false }),
        )
        .await
        .expect("rendered")
        .to_json();

    assert_eq!(value["svg"]["headers"]["content-type"], "image/svg+xml");
    assert!(value["svg"]["body"].as_str().expect("body").starts_with("<svg"));
    assert_eq!(value["png"]["headers"]["content-type"], "image/png");
    assert_eq!(
        value["mml"]["headers"]["x-math-style"],
        "vertical-align: -0.1ex; width:2ex; height:1ex;"
    );
    assert_eq!(value["success"], true);
}

#[tokio::test]
async fn unreachable_typesetter_is_a_server_error() {
    let harness = Harness::default();
    harness.take_typesetter_down();

    let err = harness
        .service
        .render(RenderRequest::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "engine_unavailable");
    assert_eq!(err.status(), 500);
}

#[tokio::test]
async fn speak_text_off_omits_speech() {
    let harness = Harness::new(Capabilities {
        speech_config: SpeechConfig {
            speak_text: false,
            ..SpeechConfig::default()
        },
        ..Capabilities::default()
    });

    let value = harness
        .service
        .render(RenderRequest::new("x^2").with_features(Features { speech: true }))
        .await
        .expect("rendered")
        .to_json();
    assert_eq!(value["success"], true);
    assert!(value.get("speech").is_none());
    assert!(value.get("speakText").is_none());

    let err = harness
        .service
        .render(RenderRequest::new("x^2").with_output_format("speech"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "no_suitable_output");
    assert_eq!(Calls::get(&harness.calls.speak), 0);
}

#[tokio::test]
async fn raster_needs_the_vector_stage() {
    let harness = Harness::new(Capabilities {
        svg: false,
        png: true,
        ..Capabilities::default()
    });

    for format in ["json", "complete"] {
        let value = harness
            .service
            .render(
                RenderRequest::new("x")
                    .with_output_format(format)
                    .with_features(Features { speech: false }),
            )
            .await
            .expect("rendered")
            .to_json();
        assert!(value.get("png").is_none(), "{format}: {value}");
        assert!(value.get("svg").is_none(), "{format}: {value}");
    }
    assert_eq!(Calls::get(&harness.calls.rasterize), 0);
}

#[tokio::test]
async fn enrich_replaces_the_annotated_mathml() {
    let harness = Harness::new(Capabilities {
        speech_config: SpeechConfig {
            enrich: true,
            ..SpeechConfig::default()
        },
        ..Capabilities::default()
    });

    let value = harness
        .service
        .render(RenderRequest::new("x^2").with_features(Features { speech: true }))
        .await
        .expect("rendered")
        .to_json();

    let mml = value["mml"].as_str().expect("mml");
    assert!(mml.starts_with("<math data-semantic-enriched=\"true\""), "{mml}");
    assert!(mml.contains(&format!("alttext=\"{SPOKEN}\"")), "{mml}");
    assert_eq!(value["speech"], SPOKEN);
}

#[tokio::test]
async fn engine_reported_errors_fail_the_request() {
    let harness = Harness::default();
    let err = harness
        .service
        .render(RenderRequest::new("\\unsupported x").with_output_format("svg"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "typeset_failed");
    assert_eq!(err.to_string(), "Undefined control sequence: \\unsupported");
    assert_eq!(Calls::get(&harness.calls.rasterize), 0);
    assert_eq!(Calls::get(&harness.calls.speak), 0);
}
