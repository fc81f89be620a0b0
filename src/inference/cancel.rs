//! Cancelamento cooperativo do motor de inferência.
//!
//! O motor consulta um [`CancellationCheck`] antes da primeira iteração e a
//! cada fronteira de iteração. Uma iteração interrompida é descartada por
//! inteiro.
//!
//! A [`CancelFlag`] guarda dois bits num único atômico:
//!
//! | Bit | Quem liga | Quem desliga |
//! |-----|-----------|--------------|
//! | `RUNNING` | `begin_run` | fim do [`RunGuard`] |
//! | `CANCELLED` | `cancel`, `cancel_running` | `reset`, fim do [`RunGuard`] |
//!
//! O fim de uma execução limpa os dois bits: um pedido que chega depois
//! dela não sobra armado para a próxima.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const RUNNING: u8 = 0b01;
const CANCELLED: u8 = 0b10;

/// Sinal de cancelamento consultado pelo motor.
pub trait CancellationCheck {
    fn is_cancelled(&self) -> bool;
}

/// Qualquer closure `Fn() -> bool` serve como sinal.
impl<F> CancellationCheck for F
where
    F: Fn() -> bool,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Flag compartilhável entre threads (ex.: handler HTTP `/cancel`).
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicU8>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arma a flag incondicionalmente; vale para a execução corrente ou a
    /// próxima que começar.
    pub fn cancel(&self) {
        self.0.fetch_or(CANCELLED, Ordering::SeqCst);
    }

    /// Arma a flag só se houver uma execução em andamento.
    ///
    /// Retorna `false` quando nada está rodando; nesse caso o pedido é
    /// descartado.
    pub fn cancel_running(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
                (state & RUNNING != 0).then_some(state | CANCELLED)
            })
            .is_ok()
    }

    /// Desarma a flag.
    pub fn reset(&self) {
        self.0.fetch_and(!CANCELLED, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst) & RUNNING != 0
    }

    /// Marca o início de uma execução; o guard limpa a flag ao sair.
    pub fn begin_run(&self) -> RunGuard<'_> {
        self.0.fetch_or(RUNNING, Ordering::SeqCst);
        RunGuard(self)
    }
}

impl CancellationCheck for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst) & CANCELLED != 0
    }
}

/// Execução em andamento, criada por [`CancelFlag::begin_run`].
#[must_use]
pub struct RunGuard<'a>(&'a CancelFlag);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        (self.0).0.store(0, Ordering::SeqCst);
    }
}
