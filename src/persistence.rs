//! # Persistência — Conhecimento Base do Projeto em Disco
//!
//! Serializa/desserializa a [`KnowledgeBase`] como JSON. Só o conhecimento
//! **base** vai para disco (via [`KnowledgeBase::project_snapshot`]):
//!
//! | Conteúdo | Salvo? |
//! |----------|--------|
//! | fatos, fatos negativos e regras com tag `Base` | sim |
//! | contador Skolem | sim |
//! | asserções de sessão | não |
//! | fatos derivados | não (recalculados sob demanda) |
//! | índices | não (reconstruídos com [`KnowledgeBase::rebuild_index`]) |
//!
//! ## Atomicidade
//!
//! A escrita vai para `<arquivo>.tmp` e depois é renomeada sobre o destino:
//! um crash no meio da escrita nunca deixa um projeto truncado.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::KnowledgeBase;

/// Salva o conhecimento base de `kb` em `path` como JSON pretty-printed.
///
/// Cria o diretório pai se não existir.
///
/// # Erros
///
/// Retorna erro se não conseguir criar o diretório, serializar, escrever ou
/// renomear o arquivo temporário.
pub fn save_kb(kb: &KnowledgeBase, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Falha ao criar diretório {}", parent.display()))?;
    }
    let snapshot = kb.project_snapshot();
    let json = serde_json::to_string_pretty(&snapshot)
        .context("Falha ao serializar KnowledgeBase")?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("Falha ao escrever {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Falha ao renomear {} para {}", tmp.display(), path.display()))?;

    tracing::info!(
        path = %path.display(),
        facts = snapshot.fact_count(),
        rules = snapshot.rule_count(),
        "Projeto salvo"
    );
    Ok(())
}

/// Carrega a KB de `path`, ou cria uma vazia se o arquivo não existir.
///
/// # Erros
///
/// Retorna erro se o arquivo existir mas estiver corrompido ou incompatível.
pub fn load_kb(path: &Path) -> Result<KnowledgeBase> {
    if !path.exists() {
        tracing::info!("Nenhum {} encontrado, iniciando KB vazia", path.display());
        return Ok(KnowledgeBase::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Falha ao ler {}", path.display()))?;
    let mut kb: KnowledgeBase = serde_json::from_str(&json)
        .with_context(|| format!("Falha ao desserializar {}", path.display()))?;
    kb.rebuild_index();
    Ok(kb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GroundAtom, Constant, Provenance, SessionTag};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("logic-calculator-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    fn atom(p: &str, a: &str) -> GroundAtom {
        GroundAtom::new(p, vec![Constant::new(a)])
    }

    #[test]
    fn missing_file_yields_empty_kb() {
        let kb = load_kb(&temp_path("nope.json")).unwrap();
        assert_eq!(kb.fact_count(), 0);
    }

    /// Só o conhecimento base sobrevive ao ciclo salvar/carregar.
    #[test]
    fn save_keeps_only_base_knowledge() {
        let path = temp_path("project.json");
        let mut kb = KnowledgeBase::new();
        kb.add_fact(atom("man", "john"), Provenance::asserted(None, SessionTag::Base));
        let session = kb.current_session();
        kb.add_fact(atom("man", "mary"), Provenance::asserted(None, session));
        kb.fresh_skolem();

        save_kb(&kb, &path).unwrap();
        let loaded = load_kb(&path).unwrap();

        assert_eq!(loaded.fact_count(), 1);
        assert!(loaded.contains_fact(&atom("man", "john")));
        assert!(!loaded.contains_fact(&atom("man", "mary")));
        assert_eq!(loaded.skolem_counter(), 1);
        assert!(!path.with_extension("json.tmp").exists());

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_path("broken.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_kb(&path).is_err());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
