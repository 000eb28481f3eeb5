#![no_std]
#![no_main]

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::Instant;
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig, UsbDevice};
use gpio_to_gamepad::usb_output::UsbDriver;
use gpio_to_gamepad::{
    config, configure_usb_hid, GamepadBridge, GamepadRequestHandler, InputSampler,
    UsbEventHandler, UsbHidTransport, DPAD_POLICY, REMOTE_WAKEUP, USB_EVENTS, USB_STATUS,
    WAKEUP_POLICY,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

type Bridge =
    GamepadBridge<InputSampler<Input<'static>>, UsbHidTransport<'static>, Output<'static>>;

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state and callback handlers.
static HID_STATE: StaticCell<State> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<GamepadRequestHandler> = StaticCell::new();
static EVENT_HANDLER: StaticCell<UsbEventHandler> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("GPIO-to-Gamepad starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Buttons: GPIO 0-11 in mapping order, pulled up, active low ---
    let buttons = [
        Input::new(p.PIN_0, Pull::Up),  // A
        Input::new(p.PIN_1, Pull::Up),  // B
        Input::new(p.PIN_2, Pull::Up),  // X
        Input::new(p.PIN_3, Pull::Up),  // Y
        Input::new(p.PIN_4, Pull::Up),  // Up
        Input::new(p.PIN_5, Pull::Up),  // Down
        Input::new(p.PIN_6, Pull::Up),  // Left
        Input::new(p.PIN_7, Pull::Up),  // Right
        Input::new(p.PIN_8, Pull::Up),  // LB
        Input::new(p.PIN_9, Pull::Up),  // RB
        Input::new(p.PIN_10, Pull::Up), // Select
        Input::new(p.PIN_11, Pull::Up), // Start
    ];
    let sampler = InputSampler::new(buttons);

    // Status LED (on-board LED on Pico)
    let led = Output::new(p.PIN_25, Level::Low);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;
    usb_config.supports_remote_wakeup = true;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    builder.handler(EVENT_HANDLER.init(UsbEventHandler::new(&USB_STATUS)));

    // Configure HID class
    let hid_state = HID_STATE.init(State::new());
    let request_handler = REQUEST_HANDLER.init(GamepadRequestHandler);
    let hid_writer = configure_usb_hid(&mut builder, hid_state, request_handler);

    // Build the USB device
    let usb_device = builder.build();

    let transport = UsbHidTransport::new(hid_writer, &USB_STATUS, &REMOTE_WAKEUP);
    let bridge = GamepadBridge::new(sampler, transport, led)
        .with_dpad_policy(DPAD_POLICY)
        .with_wakeup_policy(WAKEUP_POLICY);

    info!(
        "d-pad policy {:?}, wakeup policy {:?}",
        DPAD_POLICY, WAKEUP_POLICY
    );

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(gamepad_task(bridge).unwrap());

    info!("GPIO-to-Gamepad initialized, waiting for host...");
}

/// USB device task - runs the USB stack and signals remote wakeup on request.
#[embassy_executor::task]
async fn usb_task(mut device: UsbDevice<'static, UsbDriver<'static>>) {
    loop {
        device.run_until_suspend().await;
        // Requests raised before this suspend are stale.
        REMOTE_WAKEUP.reset();

        match select(device.wait_resume(), REMOTE_WAKEUP.wait()).await {
            Either::First(()) => {}
            Either::Second(()) => {
                info!("signaling remote wakeup");
                if let Err(e) = device.remote_wakeup().await {
                    warn!("Remote wakeup failed: {:?}", e);
                }
            }
        }
    }
}

/// Gamepad task - the cooperative main loop.
///
/// Each pass applies pending bus events, runs the status LED and HID tasks
/// against the millisecond clock, then yields back to the USB task.
#[embassy_executor::task]
async fn gamepad_task(mut bridge: Bridge) {
    loop {
        while let Ok(event) = USB_EVENTS.try_receive() {
            bridge.handle_event(&event).await;
        }

        let now_ms = Instant::now().as_millis() as u32;
        bridge.poll(now_ms).await;

        yield_now().await;
    }
}
