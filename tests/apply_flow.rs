//! End-to-end session flows against a scripted gateway, without any UI.

use futures::executor::block_on;
use image::RgbaImage;
use inpaint_studio::{
    Busy, GatewayError, ModelGateway, PngImage, ScriptedGateway, Session, SessionEvent,
    DEFAULT_PROMPT,
};

fn png(side: u32) -> PngImage {
    PngImage::from_rgba(&RgbaImage::new(side, side)).unwrap()
}

/// Drives the same trigger-then-call choreography the app shell performs.
fn upload(session: &mut Session, gateway: &ScriptedGateway, image: PngImage) {
    session.reduce(SessionEvent::UploadStarted {
        image: image.clone(),
    });
    let generation = session.generation();
    let result = block_on(gateway.suggest_prompt(image));
    session.reduce(SessionEvent::PromptSuggested { generation, result });
}

fn apply(session: &mut Session, gateway: &ScriptedGateway) {
    let input = session.apply_input().cloned().expect("original present");
    let prompt = session.prompt.clone();
    session.reduce(SessionEvent::ApplyStarted);
    assert_eq!(session.busy, Busy::Processing);
    let generation = session.generation();
    let result = block_on(gateway.inpaint(input, prompt));
    session.reduce(SessionEvent::InpaintFinished { generation, result });
}

#[test]
fn upload_mask_apply_stores_result() {
    let gateway = ScriptedGateway::default();
    gateway.push_suggestion(Ok("TASK: add two people".into()));
    let generated = png(5);
    gateway.push_inpaint(Ok(generated.clone()));

    let mut session = Session::default();
    upload(&mut session, &gateway, png(8));
    assert_eq!(session.prompt, "TASK: add two people");

    let composite = png(3);
    session.reduce(SessionEvent::MaskUpdated {
        composite: composite.clone(),
    });
    apply(&mut session, &gateway);

    assert_eq!(session.result, Some(generated));
    assert_eq!(session.busy, Busy::Idle);
    assert!(session.error.is_none());

    // The inpaint call received the masked composite and the suggested prompt.
    match &gateway.invocations()[1] {
        inpaint_studio::Invocation::Inpaint { image, prompt } => {
            assert_eq!(image, &composite);
            assert_eq!(prompt, "TASK: add two people");
        }
        other => panic!("unexpected invocation {other:?}"),
    }
}

#[test]
fn apply_without_mask_sends_the_original_unmodified() {
    let gateway = ScriptedGateway::default();
    gateway.push_suggestion(Ok("prompt".into()));
    gateway.push_inpaint(Ok(png(5)));

    let original = png(8);
    let mut session = Session::default();
    upload(&mut session, &gateway, original.clone());
    apply(&mut session, &gateway);

    match &gateway.invocations()[1] {
        inpaint_studio::Invocation::Inpaint { image, .. } => assert_eq!(image, &original),
        other => panic!("unexpected invocation {other:?}"),
    }
}

#[test]
fn failed_suggestion_leaves_a_usable_default_prompt() {
    let gateway = ScriptedGateway::default();
    gateway.push_suggestion(Err(GatewayError::Failure("connection refused".into())));

    let mut session = Session::default();
    upload(&mut session, &gateway, png(8));

    assert_eq!(session.prompt, DEFAULT_PROMPT);
    assert_eq!(session.error.as_deref(), Some("connection refused"));
    assert_eq!(session.busy, Busy::Idle);
}

#[test]
fn inpaint_without_image_part_surfaces_fixed_message() {
    let gateway = ScriptedGateway::default();
    gateway.push_suggestion(Ok("prompt".into()));
    gateway.push_inpaint(Err(GatewayError::NoImageReturned));

    let mut session = Session::default();
    upload(&mut session, &gateway, png(8));
    apply(&mut session, &gateway);

    assert_eq!(
        session.error.as_deref(),
        Some("The model did not return an edited image.")
    );
    assert!(session.result.is_none());
}

#[test]
fn smart_fix_feeds_corrective_prompt_back_into_edit_mode() {
    let gateway = ScriptedGateway::default();
    gateway.push_suggestion(Ok("prompt".into()));
    gateway.push_inpaint(Ok(png(5)));
    gateway.push_analysis(Ok("FIX INSTRUCTION: remove the floating lamp".into()));

    let mut session = Session::default();
    upload(&mut session, &gateway, png(8));
    apply(&mut session, &gateway);

    let original = session.original.clone().unwrap();
    let result = session.result.clone().unwrap();
    session.reduce(SessionEvent::SmartFixStarted);
    assert_eq!(session.busy, Busy::Analyzing);
    let generation = session.generation();
    let analysis = block_on(gateway.analyze_result(original, result));
    session.reduce(SessionEvent::AnalysisFinished {
        generation,
        result: analysis,
    });

    assert_eq!(session.prompt, "FIX INSTRUCTION: remove the floating lamp");
    assert!(session.result.is_none());
    assert!(session.original.is_some());
}

#[test]
fn reply_arriving_after_reset_is_dropped() {
    let gateway = ScriptedGateway::default();
    gateway.push_suggestion(Ok("too late".into()));

    let mut session = Session::default();
    session.reduce(SessionEvent::UploadStarted { image: png(8) });
    let generation = session.generation();
    let pending = gateway.suggest_prompt(session.original.clone().unwrap());

    session.reduce(SessionEvent::Reset);
    let result = block_on(pending);
    session.reduce(SessionEvent::PromptSuggested { generation, result });

    assert!(session.prompt.is_empty());
    assert!(session.original.is_none());
    assert_eq!(session.busy, Busy::Idle);
}
