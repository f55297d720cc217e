//! Confidence gate and intent dispatch.

use bibliobot_core::{ClassificationResult, Intent, CONFIDENCE_THRESHOLD};

#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Intent(Intent),
    Unrecognized(UnrecognizedReason),
}

#[derive(Clone, Debug, PartialEq)]
pub enum UnrecognizedReason {
    LowConfidence { confidence: f64 },
    UnmappedIntent { label: String },
}

impl UnrecognizedReason {
    /// Log-facing description; never sent to the user.
    pub fn describe(&self) -> String {
        match self {
            Self::LowConfidence { .. } => "Confiança baixa.".to_string(),
            Self::UnmappedIntent { label } => format!("Intenção '{label}' não mapeada."),
        }
    }
}

/// Applies the threshold gate first, then the exact-match dispatch table.
/// Below-threshold results are unrecognized regardless of label.
pub fn route(result: &ClassificationResult) -> Route {
    if result.confidence < CONFIDENCE_THRESHOLD {
        return Route::Unrecognized(UnrecognizedReason::LowConfidence {
            confidence: result.confidence,
        });
    }

    match Intent::from_label(&result.top_intent) {
        Some(intent) => Route::Intent(intent),
        None => Route::Unrecognized(UnrecognizedReason::UnmappedIntent {
            label: result.top_intent.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use bibliobot_core::{ClassificationResult, Intent};

    use super::{route, Route, UnrecognizedReason};

    #[test]
    fn below_threshold_is_unrecognized_regardless_of_label() {
        for label in ["Consultar_Horario", "Renovar_Emprestimo", "Reservar_Livro", "Qualquer"] {
            for confidence in [0.0, 0.1, 0.55, 0.6999] {
                let decision = route(&ClassificationResult::new(label, confidence));
                assert!(
                    matches!(
                        decision,
                        Route::Unrecognized(UnrecognizedReason::LowConfidence { .. })
                    ),
                    "label {label} at {confidence} must be unrecognized"
                );
            }
        }
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let decision = route(&ClassificationResult::new("Consultar_Horario", 0.70));
        assert_eq!(decision, Route::Intent(Intent::ConsultarHorario));
    }

    #[test]
    fn confident_known_labels_dispatch_to_their_handler() {
        let cases = [
            ("Consultar_Horario", Intent::ConsultarHorario),
            ("Renovar_Emprestimo", Intent::RenovarEmprestimo),
            ("Reservar_Livro", Intent::ReservarLivro),
        ];
        for (label, expected) in cases {
            assert_eq!(
                route(&ClassificationResult::new(label, 0.91)),
                Route::Intent(expected),
                "label {label} must reach its responder"
            );
        }
    }

    #[test]
    fn confident_unknown_label_is_unmapped() {
        let decision = route(&ClassificationResult::new("Devolver_Livro", 0.95));
        assert_eq!(
            decision,
            Route::Unrecognized(UnrecognizedReason::UnmappedIntent {
                label: "Devolver_Livro".to_string()
            })
        );
    }

    #[test]
    fn empty_label_from_malformed_response_is_unrecognized() {
        // A malformed provider payload decodes to the default result; the
        // zero confidence alone must push it down the unrecognized path.
        let decision = route(&ClassificationResult::default());
        assert!(matches!(
            decision,
            Route::Unrecognized(UnrecognizedReason::LowConfidence { .. })
        ));
    }

    #[test]
    fn reservation_below_threshold_is_not_dispatched() {
        let decision = route(&ClassificationResult::new("Reservar_Livro", 0.55));
        assert!(matches!(decision, Route::Unrecognized(_)));
    }

    #[test]
    fn reasons_render_operator_friendly_descriptions() {
        assert_eq!(
            UnrecognizedReason::LowConfidence { confidence: 0.55 }.describe(),
            "Confiança baixa."
        );
        assert_eq!(
            UnrecognizedReason::UnmappedIntent { label: "Devolver_Livro".to_string() }.describe(),
            "Intenção 'Devolver_Livro' não mapeada."
        );
    }
}
