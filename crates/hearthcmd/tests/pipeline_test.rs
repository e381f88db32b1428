use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use hearthcmd::CommandError;
use hearthcmd::CommandHandler;
use hearthcmd::Config;
use hearthcmd::Inventory;
use hearthcmd::completion::CompletionError;
use hearthcmd::completion::CompletionRequest;
use hearthcmd::completion::CompletionService;
use hearthcmd::dispatch::AccessoryHost;
use hearthcmd::dispatch::HostError;
use hearthcmd::dispatch::InventoryHost;
use hearthcmd::inventory::Characteristic;
use hearthcmd::inventory::CharacteristicKind;
use hearthcmd::inventory::CharacteristicValue;
use hearthcmd::inventory::Device;
use hearthcmd::inventory::Service;
use hearthcmd::inventory::ServiceKind;
use hearthcmd::inventory::ServiceRef;

/// Completion service with a fixed answer that counts its calls
struct MockCompletion {
    reply: Result<&'static str, u16>,
    calls: AtomicUsize,
    /// Inventory replacement applied while the call is "in flight"
    update_during_call: Mutex<Option<(Arc<Inventory>, Vec<Device>)>>,
}

impl MockCompletion {
    fn replying(text: &'static str) -> Self {
        Self {
            reply: Ok(text),
            calls: AtomicUsize::new(0),
            update_during_call: Mutex::new(None),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            ..Self::replying("")
        }
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let pending = self.update_during_call.lock().unwrap().take();
        if let Some((inventory, devices)) = pending {
            inventory.update(devices);
        }

        match self.reply {
            Ok(text) => Ok(text.to_string()),
            Err(status) => Err(CompletionError::Status {
                status,
                body: "Too Many Requests".to_string(),
            }),
        }
    }
}

/// Accessory host that records writes before applying them to the inventory
struct RecordingHost {
    inner: InventoryHost,
    writes: AtomicUsize,
}

#[async_trait]
impl AccessoryHost for RecordingHost {
    async fn set_characteristic(
        &self,
        device: &str,
        service: ServiceRef<'_>,
        characteristic: CharacteristicKind,
        value: CharacteristicValue,
    ) -> Result<CharacteristicValue, HostError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner
            .set_characteristic(device, service, characteristic, value)
            .await
    }
}

struct Harness {
    inventory: Arc<Inventory>,
    completion: Arc<MockCompletion>,
    host: Arc<RecordingHost>,
    handler: CommandHandler<Arc<MockCompletion>, Arc<RecordingHost>>,
}

fn living_room_light(on: bool) -> Device {
    Device {
        name: "Living Room Light".to_string(),
        services: vec![Service {
            name: "Living Room Light".to_string(),
            kind: ServiceKind::Lightbulb,
            characteristics: vec![Characteristic {
                name: "On".to_string(),
                kind: CharacteristicKind::On,
                value: CharacteristicValue::Bool(on),
            }],
        }],
    }
}

fn harness(completion: MockCompletion) -> Harness {
    let inventory = Arc::new(Inventory::new(vec![living_room_light(false)]));
    let completion = Arc::new(completion);
    let host = Arc::new(RecordingHost {
        inner: InventoryHost::new(inventory.clone()),
        writes: AtomicUsize::new(0),
    });
    let handler = CommandHandler::new(
        inventory.clone(),
        completion.clone(),
        host.clone(),
        &Config::default(),
    );

    Harness {
        inventory,
        completion,
        host,
        handler,
    }
}

fn light_value(inventory: &Inventory) -> CharacteristicValue {
    inventory.find_by_name("Living Room Light").unwrap().services[0].characteristics[0]
        .value
        .clone()
}

#[tokio::test]
async fn test_turn_on_living_room_light() {
    let h = harness(MockCompletion::replying(
        r#"{"action": "turn on", "device": "Living Room Light"}"#,
    ));

    let outcome = h.handler.handle("turn on the living room lights").await.unwrap();

    assert_eq!(outcome.device, "Living Room Light");
    assert_eq!(outcome.value, CharacteristicValue::Bool(true));
    assert_eq!(light_value(&h.inventory), CharacteristicValue::Bool(true));
    assert_eq!(h.host.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_device_is_reported() {
    let h = harness(MockCompletion::replying(
        r#"{"action": "turn on", "device": "Garage Door"}"#,
    ));

    let err = h.handler.handle("open the garage door").await.unwrap_err();

    assert_eq!(err, CommandError::DeviceNotFound("Garage Door".to_string()));
    assert_eq!(h.host.writes.load(Ordering::SeqCst), 0);
    assert_eq!(light_value(&h.inventory), CharacteristicValue::Bool(false));
}

#[tokio::test]
async fn test_empty_command_never_calls_completion() {
    let h = harness(MockCompletion::replying(
        r#"{"action": "turn on", "device": "Living Room Light"}"#,
    ));

    let err = h.handler.handle("").await.unwrap_err();

    assert_eq!(err, CommandError::EmptyCommand);
    assert_eq!(h.completion.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.host.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rate_limited_completion_skips_dispatch() {
    let h = harness(MockCompletion::failing(429));

    let err = h.handler.handle("turn on the living room lights").await.unwrap_err();

    assert_eq!(err.remote_status(), Some(429));
    assert!(matches!(err, CommandError::RemoteCallFailed { .. }));
    assert_eq!(h.completion.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.host.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_completion_skips_dispatch() {
    let h = harness(MockCompletion::replying("Sure! I turned on the living room light."));

    let err = h.handler.handle("turn on the living room lights").await.unwrap_err();

    assert!(matches!(err, CommandError::MalformedIntent { .. }));
    assert_eq!(h.host.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_command_is_idempotent() {
    let h = harness(MockCompletion::replying(
        r#"{"action": "turn on", "device": "Living Room Light"}"#,
    ));

    let first = h.handler.handle("lights on please").await.unwrap();
    let after_first = light_value(&h.inventory);
    let second = h.handler.handle("lights on please").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first, light_value(&h.inventory));
    assert_eq!(after_first, CharacteristicValue::Bool(true));
}

#[tokio::test]
async fn test_dispatch_uses_inventory_after_concurrent_update() {
    let h = harness(MockCompletion::replying(
        r#"{"action": "turn on", "device": "Living Room Light"}"#,
    ));

    // The light is removed while the completion call is in flight
    *h.completion.update_during_call.lock().unwrap() = Some((h.inventory.clone(), vec![]));

    let err = h.handler.handle("turn on the living room lights").await.unwrap_err();
    assert_eq!(
        err,
        CommandError::DeviceNotFound("Living Room Light".to_string())
    );
    assert!(h.inventory.snapshot().is_empty());
}

#[tokio::test]
async fn test_concurrent_commands_are_independent() {
    let inventory = Arc::new(Inventory::new(vec![
        living_room_light(false),
        Device {
            name: "Hallway".to_string(),
            services: vec![Service {
                name: "Thermostat".to_string(),
                kind: ServiceKind::Thermostat,
                characteristics: vec![Characteristic {
                    name: "Target Temperature".to_string(),
                    kind: CharacteristicKind::TargetTemperature,
                    value: CharacteristicValue::Int(18),
                }],
            }],
        },
    ]));
    let host = Arc::new(InventoryHost::new(inventory.clone()));
    let config = Config::default();

    let light = CommandHandler::new(
        inventory.clone(),
        MockCompletion::replying(r#"{"action": "turn on", "device": "Living Room Light"}"#),
        host.clone(),
        &config,
    );
    let thermostat = CommandHandler::new(
        inventory.clone(),
        MockCompletion::replying(r#"{"action": "set temperature to 21", "device": "Hallway"}"#),
        host,
        &config,
    );

    let (a, b) = tokio::join!(
        light.handle("lights on"),
        thermostat.handle("warm up the hallway")
    );

    assert_eq!(a.unwrap().value, CharacteristicValue::Bool(true));
    assert_eq!(b.unwrap().value, CharacteristicValue::Int(21));

    let hallway = inventory.find_by_name("hallway").unwrap();
    assert_eq!(
        hallway.services[0].characteristics[0].value,
        CharacteristicValue::Int(21)
    );
    assert_eq!(light_value(&inventory), CharacteristicValue::Bool(true));
}
