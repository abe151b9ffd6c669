//! # Control de Admisión
//! src/server/admission.rs
//!
//! Semáforo contador que acota cuántos requests se procesan a la vez. El
//! acceptor toma un [`Permit`] antes de despachar una conexión; el permiso
//! se libera en el `Drop`, así que se devuelve exactamente una vez en todo
//! camino de salida (éxito, error o panic).

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Estado protegido por el mutex
#[derive(Debug, Default)]
struct AdmissionState {
    /// Permisos entregados y no devueltos
    in_flight: usize,

    /// Máximo histórico de `in_flight`
    peak: usize,
}

/// Semáforo de admisión thread-safe
#[derive(Debug)]
pub struct AdmissionControl {
    state: Mutex<AdmissionState>,

    /// Notifica cuando se libera un permiso
    released: Condvar,

    capacity: usize,
}

impl AdmissionControl {
    /// Crea un semáforo con `capacity` permisos (mínimo 1)
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(AdmissionState::default()),
            released: Condvar::new(),
            capacity: capacity.max(1),
        })
    }

    /// Toma un permiso, bloqueando mientras el límite esté saturado
    pub fn acquire(self: &Arc<Self>) -> Permit {
        let mut state = self.lock();

        while state.in_flight >= self.capacity {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        self.grant(&mut state)
    }

    /// Permisos actualmente entregados
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Máximo de permisos entregados simultáneamente desde el arranque
    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn grant(self: &Arc<Self>, state: &mut AdmissionState) -> Permit {
        state.in_flight += 1;
        state.peak = state.peak.max(state.in_flight);

        Permit {
            control: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);

        self.released.notify_one();
    }

    // Un panic con el lock tomado no debe dejar el semáforo inutilizable
    fn lock(&self) -> MutexGuard<'_, AdmissionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Permiso de admisión; se devuelve al salir de scope
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct Permit {
    control: Arc<AdmissionControl>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.control.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_up_to_capacity() {
        let control = AdmissionControl::new(2);

        let first = control.acquire();
        let second = control.acquire();
        assert_eq!(control.in_flight(), 2);

        drop(first);
        assert_eq!(control.in_flight(), 1);
        let third = control.acquire();
        assert_eq!(control.in_flight(), 2);

        drop(second);
        drop(third);
        assert_eq!(control.in_flight(), 0);
        assert_eq!(control.peak(), 2);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let control = AdmissionControl::new(0);
        assert_eq!(control.capacity(), 1);

        let _permit = control.acquire();
        assert_eq!(control.in_flight(), 1);
    }

    #[test]
    fn test_acquire_blocks_until_release() {
        let control = AdmissionControl::new(1);
        let held = control.acquire();

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                let _permit = control.acquire();
                tx.send(()).unwrap();
            })
        };

        // Mientras el permiso esté tomado el waiter no avanza
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        drop(held);
        rx.recv_timeout(Duration::from_secs(5)).expect("waiter never admitted");
        waiter.join().unwrap();

        assert_eq!(control.in_flight(), 0);
        assert_eq!(control.peak(), 1);
    }

    #[test]
    fn test_permit_released_on_panic() {
        let control = AdmissionControl::new(1);

        let result = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                let _permit = control.acquire();
                panic!("handler blew up");
            })
            .join()
        };

        assert!(result.is_err());
        assert_eq!(control.in_flight(), 0);

        let _permit = control.acquire();
        assert_eq!(control.in_flight(), 1);
    }

    #[test]
    fn test_never_exceeds_capacity_under_contention() {
        let control = AdmissionControl::new(3);

        let workers: Vec<_> = (0..12)
            .map(|_| {
                let control = Arc::clone(&control);
                thread::spawn(move || {
                    let _permit = control.acquire();
                    assert!(control.in_flight() <= 3);
                    thread::sleep(Duration::from_millis(20));
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert!(control.peak() <= 3);
        assert_eq!(control.in_flight(), 0);
    }
}
