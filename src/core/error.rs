//! # Erros da Calculadora Lógica
//!
//! Toda falha do núcleo é representada por um [`CalcError`] — nenhuma é fatal
//! para o processo. O chamador sempre recebe um valor que pode exibir e seguir
//! em frente.
//!
//! | Variante | Escopo | Efeito na KB |
//! |----------|--------|--------------|
//! | `Classification` | uma sentença | nenhum |
//! | `RangeRestriction` | uma regra | nenhum |
//! | `InferenceLimitExceeded` | consulta | mantém fatos já derivados |
//! | `InferenceCancelled` | consulta | KB da última iteração completa |
//! | `ParserUnavailable` | requisição | nenhum |
//! | `QueryMalformed` | consulta | nenhum |
//!
//! Erros locais (`Classification`, `RangeRestriction`) são recuperados no
//! nível da sentença e reportados junto ao fragmento ofensor; os demais
//! propagam inalterados até quem fez a consulta.

use serde::Serialize;

/// Alias de `Result` usado em todo o núcleo.
pub type Result<T> = std::result::Result<T, CalcError>;

/// Taxonomia de erros do núcleo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalcError {
    /// A árvore de cláusula não corresponde a nenhum template reconhecido.
    #[error("sentença não reconhecida: \"{fragment}\" ({reason})")]
    Classification { fragment: String, reason: String },

    /// Variável da cabeça da regra não aparece em nenhum átomo positivo do corpo.
    #[error("regra rejeitada, variável {variable} da cabeça não é restrita pelo corpo: {rule}")]
    RangeRestriction { rule: String, variable: String },

    /// O ponto fixo não convergiu dentro do limite configurado.
    #[error("inferência não convergiu em {iterations} iterações ({derived} fatos derivados)")]
    InferenceLimitExceeded { iterations: usize, derived: usize },

    /// Cancelamento solicitado pelo chamador.
    #[error("inferência cancelada após {completed} iterações completas")]
    InferenceCancelled { completed: usize },

    /// Colaborador externo de parsing inacessível ou esgotou o tempo.
    #[error("parser indisponível: {message}")]
    ParserUnavailable { message: String },

    /// Aridade desconhecida ou mais de uma variável livre.
    #[error("consulta malformada: {message}")]
    QueryMalformed { message: String },
}

impl CalcError {
    /// Atalho para construir um [`CalcError::Classification`].
    pub fn classification(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Classification {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }

    pub fn parser_unavailable(message: impl Into<String>) -> Self {
        CalcError::ParserUnavailable {
            message: message.into(),
        }
    }

    pub fn query_malformed(message: impl Into<String>) -> Self {
        CalcError::QueryMalformed {
            message: message.into(),
        }
    }

    /// `true` para falhas restritas a uma única sentença.
    ///
    /// Um lote de sentenças continua processando as demais quando uma delas
    /// falha com um erro local.
    pub fn is_statement_local(&self) -> bool {
        matches!(
            self,
            CalcError::Classification { .. } | CalcError::RangeRestriction { .. }
        )
    }

    /// Nome estável da variante, o mesmo usado na serialização JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::Classification { .. } => "classification",
            CalcError::RangeRestriction { .. } => "range_restriction",
            CalcError::InferenceLimitExceeded { .. } => "inference_limit_exceeded",
            CalcError::InferenceCancelled { .. } => "inference_cancelled",
            CalcError::ParserUnavailable { .. } => "parser_unavailable",
            CalcError::QueryMalformed { .. } => "query_malformed",
        }
    }
}
