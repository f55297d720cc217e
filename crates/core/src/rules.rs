//! The business-rules document: the single persisted configuration record
//! that drives every templated reply.
//!
//! Exactly one such document exists per deployment, keyed by
//! [`RULES_DOCUMENT_ID`] (the id doubles as the partition key in the remote
//! store). It is read on every message and written only when absent; the
//! canonical seed content below must stay byte-for-byte stable because
//! existing deployments share the same store.

use serde::{Deserialize, Serialize};

/// Well-known identifier of the one rules document.
pub const RULES_DOCUMENT_ID: &str = "library_config";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessRules {
    pub id: String,
    #[serde(default)]
    pub horarios: Horarios,
    #[serde(default)]
    pub emprestimo: Emprestimo,
    #[serde(default)]
    pub reserva: Reserva,
}

/// Opening hours. Fields are optional so a partially filled document renders
/// a placeholder instead of failing the turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Horarios {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dias_uteis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finais_de_semana: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Emprestimo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renovacao_passos: Option<String>,
    #[serde(default)]
    pub condicoes_negativas: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reserva {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integracao_status: Option<String>,
}

impl BusinessRules {
    /// Canonical seed document, written on read-miss so the bot works against
    /// an empty store. Content must match the deployed documents exactly.
    pub fn seed() -> Self {
        Self {
            id: RULES_DOCUMENT_ID.to_string(),
            horarios: Horarios {
                dias_uteis: Some("08:00 às 22:00".to_string()),
                finais_de_semana: Some(
                    "Sábados: 09:00 às 13:00. Domingos: Fechado.".to_string(),
                ),
            },
            emprestimo: Emprestimo {
                renovacao_passos: Some(
                    "A renovação deve ser feita pelo Portal do Aluno. Procure a seção 'Meus Empréstimos'."
                        .to_string(),
                ),
                condicoes_negativas: vec![
                    "Livro em atraso: Multa pendente, procure o balcão de atendimento.".to_string(),
                    "Livro reservado por outra pessoa: Não é possível renovar, devolva-o na data limite."
                        .to_string(),
                ],
            },
            reserva: Reserva {
                passos: Some(
                    "A reserva de livros é feita exclusivamente pelo sistema online no Portal do Aluno, na página de detalhes do livro."
                        .to_string(),
                ),
                integracao_status: Some(
                    "O sistema verifica a disponibilidade em tempo real.".to_string(),
                ),
            },
        }
    }
}
