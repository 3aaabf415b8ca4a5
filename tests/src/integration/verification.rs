//! # Verification Against Chain State
//!
//! Stored records are checked by calling the cross-chain contract on a
//! copy of the state pinned at the chain head. A call that runs past its
//! deadline is reported apart from a call that says "no".

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use shared_types::{address_to_word, u256_to_word, MockChain, U256};
    use std::sync::Arc;
    use std::time::Duration;
    use xc_03_call_executor::{
        CallExecutor, CallFrame, ContractCaller, InvokeError, NativeEngine, StateDb, VmError,
    };
    use xc_relay::{Relay, RelayConfig};

    const DEPTH: u64 = 2;
    const IS_ANCHOR: [u8; 4] = [0xA1, 0x2B, 0x00, 0x01];
    const STALL: [u8; 4] = [0xDE, 0xAD, 0x00, 0x00];
    const ANCHOR: [u8; 20] = [0xA0; 20];
    const STRANGER: [u8; 20] = [0x57; 20];

    /// Anchor registry: one storage slot per anchor word, non-zero when set.
    fn registry(frame: &mut CallFrame<'_>) -> Result<Vec<u8>, VmError> {
        match frame.message.selector() {
            Some(IS_ANCHOR) => {
                let args = frame.message.args();
                if args.len() != 32 {
                    return Err(VmError::Reverted {
                        output: b"bad argument".to_vec(),
                    });
                }
                let mut slot = [0u8; 32];
                slot.copy_from_slice(args);
                let this = frame.address();
                frame.step(800)?;
                let set = frame.state.storage(&this, &slot);
                if set.is_zero() {
                    return Err(VmError::Reverted {
                        output: b"not an anchor".to_vec(),
                    });
                }
                Ok(u256_to_word(&set).to_vec())
            }
            Some(STALL) => loop {
                frame.step(1)?;
                std::thread::sleep(Duration::from_millis(1));
            },
            _ => Err(VmError::Reverted { output: Vec::new() }),
        }
    }

    fn anchor_state() -> StateDb {
        let mut state = StateDb::new();
        state.set_storage(&CONTRACT, address_to_word(&ANCHOR), U256::one());
        state.freeze();
        state
    }

    fn registry_engine() -> Arc<NativeEngine> {
        Arc::new(NativeEngine::new().with_contract(CONTRACT, registry))
    }

    fn pinned_executor(chain: &MockChain) -> CallExecutor {
        CallExecutor::new(registry_engine(), chain.head(), anchor_state())
    }

    #[tokio::test]
    async fn test_confirmed_maker_checked_against_head_state() {
        let chain = Arc::new(MockChain::new(LOCAL_CHAIN));
        let config = RelayConfig {
            contract: CONTRACT,
            confirm_depth: DEPTH,
            call_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let relay = Relay::start(&config, chain.clone()).unwrap();
        let local = relay.local_store().unwrap();

        mine(&chain, &relay, vec![maker(1, REMOTE_CHAIN, 10u64.into())]);
        mine_empty(&chain, &relay, DEPTH);
        assert!(eventually(|| local.has(&id(1)).unwrap()).await);

        let record = local.read(&id(1)).unwrap();
        let exec = relay.call_executor(registry_engine(), chain.head(), anchor_state());
        assert_eq!(exec.header().number, chain.head().number);
        assert_eq!(exec.timeout(), Duration::from_secs(5));

        let anchor = address_to_word(&ANCHOR);
        let out = exec
            .call(record.data.from, CONTRACT, &IS_ANCHOR, &[&anchor])
            .await
            .unwrap();
        assert_eq!(out, u256_to_word(&U256::one()).to_vec());

        let stranger = address_to_word(&STRANGER);
        let err = exec
            .call(record.data.from, CONTRACT, &IS_ANCHOR, &[&stranger])
            .await
            .unwrap_err();
        assert!(err.is_verification_failure());
        assert!(!err.is_cancelled());

        // Still within the expiry window of a few blocks
        assert!(!relay.invoke().is_expired(&record.data, DEPTH + 1));
        mine_empty(&chain, &relay, 5);
        assert!(relay.invoke().is_expired(&record.data, DEPTH + 1));

        relay.shutdown().await;
    }

    #[tokio::test]
    async fn test_deadline_is_not_a_verdict() {
        let chain = MockChain::new(LOCAL_CHAIN);
        chain.extend(4);
        let exec = pinned_executor(&chain).with_timeout(Duration::from_millis(50));
        let caller: &dyn ContractCaller = &exec;

        let err = caller
            .call(ANCHOR, CONTRACT, &STALL, &[])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InvokeError::Cancelled {
                timeout: Duration::from_millis(50)
            }
        );
        assert!(!err.is_verification_failure());

        // The executor stays usable after a cancelled call
        let anchor = address_to_word(&ANCHOR);
        assert!(caller
            .call(ANCHOR, CONTRACT, &IS_ANCHOR, &[&anchor])
            .await
            .is_ok());
    }
}
