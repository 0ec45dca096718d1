//! Suggested prompts shown to users who need inspiration.

use serde::{Deserialize, Serialize};

/// One example prompt from the static suggestion set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPrompt {
    /// Row identifier; suggestions are ordered by it.
    pub id: i64,
    /// Prompt text.
    pub text: String,
}

impl SuggestedPrompt {
    /// Built-in suggestions used when no seed file is configured.
    pub const DEFAULTS: &'static [&'static str] = &[
        "A lighthouse on a cliff at dusk, oil painting",
        "A red bicycle leaning against a brick wall in the rain",
        "An astronaut tending a vegetable garden on the moon",
        "A fox reading a newspaper in a cozy cafe, watercolor",
        "A futuristic city skyline reflected in a still lake",
        "A bowl of ramen shaped like a volcano, studio lighting",
        "An old library inside a giant hollow tree",
        "A paper boat sailing across a sea of clouds",
    ];
}
