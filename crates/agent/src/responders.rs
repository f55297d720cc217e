//! Reply text builders.
//!
//! Every string here is an external contract: the templates are what users
//! and downstream channel tooling already see in production, so changes to
//! wording, punctuation, or line structure are breaking. Missing document
//! fields render the literal placeholder "ND" instead of failing the turn.

use bibliobot_core::BusinessRules;
use bibliobot_nlu::ClassifyError;

const MISSING_FIELD: &str = "ND";

pub const WELCOME_REPLY: &str = "Olá! Sou o Chatbot da Biblioteca.";

pub const RULES_UNAVAILABLE_REPLY: &str =
    "Desculpe, não consegui carregar as regras de negócio da biblioteca.";

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(MISSING_FIELD)
}

pub fn schedule_reply(rules: &BusinessRules) -> String {
    format!(
        "✅ **Horários de Funcionamento:**\n\n- Dias Úteis: {}\n- Finais de Semana: {}",
        field(&rules.horarios.dias_uteis),
        field(&rules.horarios.finais_de_semana),
    )
}

pub fn renewal_reply(rules: &BusinessRules) -> String {
    let conditions = rules
        .emprestimo
        .condicoes_negativas
        .iter()
        .map(|condition| format!("- {condition}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "📚 **Renovação de Livros**\n\nComo fazer: {}\n\nCondições:\n{}",
        field(&rules.emprestimo.renovacao_passos),
        conditions,
    )
}

pub fn reservation_reply(rules: &BusinessRules) -> String {
    format!(
        "📖 **Reserva de Livros**\n\nPassos: {}\nStatus: {}",
        field(&rules.reserva.passos),
        field(&rules.reserva.integracao_status),
    )
}

/// Echoes the user's text back verbatim, including whatever quoting or
/// markup it contains.
pub fn unrecognized_reply(user_text: &str) -> String {
    format!(
        "Desculpe, não entendi '{user_text}'.\nTente perguntar: 'Qual o horário?', 'Como renovar?' ou 'Quero reservar'."
    )
}

/// Exposes only the error category, never provider details or credentials.
pub fn technical_error_reply(err: &ClassifyError) -> String {
    format!("Ocorreu um erro técnico: {}", err.category())
}
