//! # Call Executor Service
//!
//! One verification call = one private state clone + one blocking engine
//! run, raced against the deadline.

use crate::domain::{CallFrame, CallMessage, StateDb};
use crate::errors::InvokeError;
use crate::ports::{ContractCaller, ExecutionEngine};
use async_trait::async_trait;
use shared_types::{short_hex, Address, BlockHeader, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Wall-clock budget of one call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs calls against state pinned at `header`.
pub struct CallExecutor {
    engine: Arc<dyn ExecutionEngine>,
    header: Arc<BlockHeader>,
    state: StateDb,
    timeout: Duration,
}

impl CallExecutor {
    pub fn new(engine: Arc<dyn ExecutionEngine>, header: BlockHeader, state: StateDb) -> Self {
        Self {
            engine,
            header: Arc::new(header),
            state,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Base state every call clones. Never written by calls.
    pub fn state(&self) -> &StateDb {
        &self.state
    }

    /// Call `to` with calldata `selector ‖ args` as `from`.
    ///
    /// The sender is credited `U256::MAX` in a clone of the base state; all
    /// writes die with the clone. On deadline expiry the engine is told to
    /// stop and `Cancelled` is returned without waiting for it.
    pub async fn call(
        &self,
        from: Address,
        to: Address,
        selector: &[u8],
        args: &[&[u8]],
    ) -> Result<Vec<u8>, InvokeError> {
        let message = CallMessage::new(from, to, selector, args);
        let mut state = self.state.copy();
        state.set_balance(&message.from, U256::MAX);

        let token = CancellationToken::new();
        // Stops the engine however this future ends, including being dropped
        let _cancel_on_exit = token.clone().drop_guard();

        let engine = Arc::clone(&self.engine);
        let header = Arc::clone(&self.header);
        let engine_token = token.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut frame = CallFrame::new(&message, &header, &mut state, &engine_token);
            engine.execute(&mut frame)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(output))) => {
                debug!(
                    "[xc-03] Call {} -> {} returned {} bytes",
                    short_hex(&from),
                    short_hex(&to),
                    output.len()
                );
                Ok(output)
            }
            Ok(Ok(Err(e))) => {
                debug!("[xc-03] Call to {} failed: {}", short_hex(&to), e);
                Err(InvokeError::Execution(e))
            }
            Ok(Err(join)) => Err(InvokeError::EngineCrashed(join.to_string())),
            Err(_) => {
                token.cancel();
                warn!(
                    "[xc-03] Call to {} cancelled after {:?}",
                    short_hex(&to),
                    self.timeout
                );
                Err(InvokeError::Cancelled {
                    timeout: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl ContractCaller for CallExecutor {
    async fn call(
        &self,
        from: Address,
        to: Address,
        selector: &[u8],
        args: &[&[u8]],
    ) -> Result<Vec<u8>, InvokeError> {
        CallExecutor::call(self, from, to, selector, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{NativeContract, NativeEngine};
    use crate::errors::VmError;
    use std::sync::atomic::{AtomicBool, Ordering};

    const SENDER: Address = [0x5E; 20];
    const CONTRACT: Address = [0xC0; 20];

    fn word(n: U256) -> Vec<u8> {
        let mut out = [0u8; 32];
        n.to_big_endian(&mut out);
        out.to_vec()
    }

    /// Returns the caller's balance.
    fn caller_balance(frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
        let caller = frame.caller();
        Ok(word(frame.state.balance(&caller)))
    }

    /// Stores calldata length in slot 0, then returns slot 0.
    fn store_len(frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
        let this = frame.address();
        let len = U256::from(frame.input().len());
        frame.state.set_storage(&this, [0; 32], len);
        frame.step(5_000)?;
        Ok(word(frame.state.storage(&this, &[0; 32])))
    }

    fn revert(_: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
        Err(VmError::Reverted {
            output: b"bad claim".to_vec(),
        })
    }

    fn crash(_: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
        panic!("engine bug")
    }

    /// Spins until cancelled, then records that it saw the cancellation.
    struct Spinner {
        stopped: Arc<AtomicBool>,
    }

    impl NativeContract for Spinner {
        fn call(&self, frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
            loop {
                if let Err(e) = frame.step(1) {
                    self.stopped.store(true, Ordering::SeqCst);
                    return Err(e);
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    fn executor(engine: NativeEngine) -> CallExecutor {
        let mut state = StateDb::new();
        state.set_balance(&SENDER, U256::from(1u64));
        state.freeze();
        CallExecutor::new(Arc::new(engine), BlockHeader::default(), state)
    }

    #[tokio::test]
    async fn test_sender_is_funded_in_clone_only() {
        let exec = executor(NativeEngine::new().with_contract(CONTRACT, caller_balance));

        let out = exec.call(SENDER, CONTRACT, &[], &[]).await.unwrap();
        assert_eq!(out, word(U256::MAX));
        assert_eq!(exec.state().balance(&SENDER), U256::from(1u64));
        assert_eq!(exec.state().nonce(&SENDER), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls_do_not_interfere() {
        let exec = executor(NativeEngine::new().with_contract(CONTRACT, store_len));

        let (a, b) = tokio::join!(
            exec.call(SENDER, CONTRACT, &[1, 2, 3, 4], &[&[0; 28]]),
            exec.call(SENDER, CONTRACT, &[1, 2, 3, 4], &[]),
        );
        assert_eq!(a.unwrap(), word(U256::from(32u64)));
        assert_eq!(b.unwrap(), word(U256::from(4u64)));
        assert!(exec.state().storage(&CONTRACT, &[0; 32]).is_zero());
    }

    #[tokio::test]
    async fn test_revert_is_verification_failure() {
        let exec = executor(NativeEngine::new().with_contract(CONTRACT, revert));

        let err = exec.call(SENDER, CONTRACT, &[], &[]).await.unwrap_err();
        assert!(err.is_verification_failure());
        assert_eq!(
            err,
            InvokeError::Execution(VmError::Reverted {
                output: b"bad claim".to_vec()
            })
        );
    }

    #[tokio::test]
    async fn test_deadline_cancels_engine() {
        let stopped = Arc::new(AtomicBool::new(false));
        let engine = NativeEngine::new().with_contract(
            CONTRACT,
            Spinner {
                stopped: stopped.clone(),
            },
        );
        let exec = executor(engine).with_timeout(Duration::from_millis(50));

        let err = exec.call(SENDER, CONTRACT, &[], &[]).await.unwrap_err();
        assert_eq!(
            err,
            InvokeError::Cancelled {
                timeout: Duration::from_millis(50)
            }
        );
        assert!(!err.is_verification_failure());

        // The engine observes the token at its next step
        for _ in 0..200 {
            if stopped.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline_is_thirty_seconds() {
        let stopped = Arc::new(AtomicBool::new(false));
        let engine = NativeEngine::new().with_contract(
            CONTRACT,
            Spinner {
                stopped: stopped.clone(),
            },
        );
        let exec = executor(engine);

        // The call registers its deadline on first poll; the clock is then
        // moved past it by hand while the engine spins on the blocking pool.
        let (result, ()) = tokio::join!(exec.call(SENDER, CONTRACT, &[], &[]), async {
            tokio::time::advance(DEFAULT_CALL_TIMEOUT).await;
        });
        assert_eq!(
            result,
            Err(InvokeError::Cancelled {
                timeout: Duration::from_secs(30)
            })
        );

        for _ in 0..200 {
            if stopped.load(Ordering::SeqCst) {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_engine_panic_is_crash() {
        let exec = executor(NativeEngine::new().with_contract(CONTRACT, crash));
        let err = exec.call(SENDER, CONTRACT, &[], &[]).await.unwrap_err();
        assert!(matches!(err, InvokeError::EngineCrashed(_)));
    }

    #[tokio::test]
    async fn test_through_caller_port() {
        let exec = executor(NativeEngine::new());
        assert_eq!(exec.timeout(), DEFAULT_CALL_TIMEOUT);

        let caller: Arc<dyn ContractCaller> = Arc::new(exec);
        let out = caller.call(SENDER, [0x77; 20], &[0xAB], &[]).await.unwrap();
        assert!(out.is_empty());
    }
}
