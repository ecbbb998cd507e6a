//! Scripted gateway for tests: replies are queued up front, every invocation
//! is recorded so tests can assert what was actually sent.

use std::{
    collections::VecDeque,
    sync::Mutex,
};

use futures::{future, future::BoxFuture, FutureExt};

use super::{GatewayError, GatewayResult, ModelGateway};
use crate::image_utils::PngImage;

#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    SuggestPrompt {
        image: PngImage,
    },
    AnalyzeResult {
        original: PngImage,
        result: PngImage,
    },
    Inpaint {
        image: PngImage,
        prompt: String,
    },
}

#[derive(Default)]
pub struct ScriptedGateway {
    suggestions: Mutex<VecDeque<GatewayResult<String>>>,
    analyses: Mutex<VecDeque<GatewayResult<String>>>,
    inpaints: Mutex<VecDeque<GatewayResult<PngImage>>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedGateway {
    pub fn push_suggestion(&self, reply: GatewayResult<String>) {
        self.suggestions.lock().unwrap().push_back(reply);
    }

    pub fn push_analysis(&self, reply: GatewayResult<String>) {
        self.analyses.lock().unwrap().push_back(reply);
    }

    pub fn push_inpaint(&self, reply: GatewayResult<PngImage>) {
        self.inpaints.lock().unwrap().push_back(reply);
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn record(&self, invocation: Invocation) {
        self.invocations.lock().unwrap().push(invocation);
    }
}

fn next<T>(queue: &Mutex<VecDeque<GatewayResult<T>>>) -> BoxFuture<'static, GatewayResult<T>>
where
    T: Send + 'static,
{
    let reply = queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(GatewayError::Failure("Script exhausted".into())));
    future::ready(reply).boxed()
}

impl ModelGateway for ScriptedGateway {
    fn suggest_prompt(&self, image: PngImage) -> BoxFuture<'static, GatewayResult<String>> {
        self.record(Invocation::SuggestPrompt { image });
        next(&self.suggestions)
    }

    fn analyze_result(
        &self,
        original: PngImage,
        result: PngImage,
    ) -> BoxFuture<'static, GatewayResult<String>> {
        self.record(Invocation::AnalyzeResult { original, result });
        next(&self.analyses)
    }

    fn inpaint(
        &self,
        image: PngImage,
        prompt: String,
    ) -> BoxFuture<'static, GatewayResult<PngImage>> {
        self.record(Invocation::Inpaint { image, prompt });
        next(&self.inpaints)
    }
}

#[cfg(test)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::async_task::AsyncTask;

    #[test]
    fn scripted_replies_come_back_in_order() {
        let gateway = ScriptedGateway::default();
        gateway.push_suggestion(Ok("first".into()));
        gateway.push_suggestion(Err(GatewayError::MissingCredential));

        let image = PngImage::from_rgba(&RgbaImage::new(1, 1)).unwrap();
        let mut a = AsyncTask::new(gateway.suggest_prompt(image.clone()));
        let mut b = AsyncTask::new(gateway.suggest_prompt(image.clone()));
        assert_eq!(a.data(), Some(Ok("first".into())));
        assert!(matches!(
            b.data(),
            Some(Err(GatewayError::MissingCredential))
        ));
        assert_eq!(gateway.invocations().len(), 2);
    }

    #[test]
    fn exhausted_script_reports_failure() {
        let gateway = ScriptedGateway::default();
        let image = PngImage::from_rgba(&RgbaImage::new(1, 1)).unwrap();
        let mut task = AsyncTask::new(gateway.inpaint(image, "prompt".into()));
        assert!(matches!(task.data(), Some(Err(GatewayError::Failure(_)))));
    }
}
