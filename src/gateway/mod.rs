use futures::future::BoxFuture;

use crate::image_utils::PngImage;

pub mod fake;
pub mod gemini;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("No API key configured. Set GEMINI_API_KEY to enable editing.")]
    MissingCredential,

    #[error("{0}")]
    Failure(String),

    #[error("The model did not return an edited image.")]
    NoImageReturned,
}

/// Three stateless calls against one multimodal endpoint. One attempt each:
/// no retries, no backoff, no streaming. Implementations take image payloads
/// by value and must not hold session state.
pub trait ModelGateway: Send + Sync {
    /// Proposes an inpainting instruction for the uploaded photo.
    fn suggest_prompt(&self, image: PngImage) -> BoxFuture<'static, GatewayResult<String>>;

    /// Inspects a generated result for rendering artifacts and proposes a
    /// corrective instruction.
    fn analyze_result(
        &self,
        original: PngImage,
        result: PngImage,
    ) -> BoxFuture<'static, GatewayResult<String>>;

    /// Fills the masked regions of `image` according to `prompt`.
    fn inpaint(
        &self,
        image: PngImage,
        prompt: String,
    ) -> BoxFuture<'static, GatewayResult<PngImage>>;
}

pub(crate) const SUGGEST_INSTRUCTION: &str = "\
You are looking at a photo of an empty interior. Propose an instruction for an \
image-editing model that adds people to the masked regions of this photo. \
Answer in exactly four sections:

TASK: one sentence describing the edit.
SUBJECT DETAILS: who should appear, their poses, clothing and activity.
TECHNICAL REQUIREMENTS: lighting direction, shadows, color temperature and \
perspective that must match the photo.
PRESERVE: everything in the photo that must remain unchanged.";

pub(crate) const ANALYZE_INSTRUCTION: &str = "\
The first image is the original photo, the second is an AI-edited version of \
it. Identify rendering artifacts in the edited image: floating objects, \
anatomical distortion, lighting mismatch, perspective errors. Answer in \
exactly two sections:

ISSUES: the artifacts you found, one per line.
FIX INSTRUCTION: a single corrective instruction for the image-editing model \
that removes these artifacts while keeping the rest of the edit.";

pub(crate) const SUGGEST_FALLBACK: &str = "\
TASK: Add people to the masked regions of the photo.
SUBJECT DETAILS: A few casually dressed people standing or sitting naturally.
TECHNICAL REQUIREMENTS: Match the photo's lighting, shadows and perspective.
PRESERVE: Keep every unmasked part of the photo unchanged.";

pub(crate) const ANALYZE_FALLBACK: &str = "\
ISSUES: Could not identify specific artifacts.
FIX INSTRUCTION: Regenerate the edited regions with consistent lighting, \
correct anatomy and accurate perspective.";
