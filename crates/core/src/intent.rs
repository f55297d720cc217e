//! Classification outcome model and the closed intent set.

use serde::{Deserialize, Serialize};

/// Confidence gate below which every classification is treated as
/// unrecognized, regardless of label. Fixed by contract with the deployed
/// classifier project; not configurable.
pub const CONFIDENCE_THRESHOLD: f64 = 0.70;

/// Normalized result of one remote classification call.
///
/// A structurally malformed provider response decodes to the default value
/// (empty label, zero confidence) instead of an error; the router then sends
/// it down the unrecognized path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub top_intent: String,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(top_intent: impl Into<String>, confidence: f64) -> Self {
        Self { top_intent: top_intent.into(), confidence }
    }
}

/// The three intents the bot answers. Labels match the classifier project
/// exactly; matching is case-sensitive with no fuzzing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    ConsultarHorario,
    RenovarEmprestimo,
    ReservarLivro,
}

impl Intent {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Consultar_Horario" => Some(Self::ConsultarHorario),
            "Renovar_Emprestimo" => Some(Self::RenovarEmprestimo),
            "Reservar_Livro" => Some(Self::ReservarLivro),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ConsultarHorario => "Consultar_Horario",
            Self::RenovarEmprestimo => "Renovar_Emprestimo",
            Self::ReservarLivro => "Reservar_Livro",
        }
    }
}
