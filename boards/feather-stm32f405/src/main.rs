#![deny(unsafe_code)]
#![deny(warnings)]
#![no_main]
#![no_std]

use defmt_rtt as _; // global logger
use panic_probe as _;
use rtic::app;
use rtic_monotonics::stm32::prelude::*;

mod device_id;
mod dht;
mod eth;
mod network;
mod runtime;
mod system;

stm32_tim2_monotonic!(Mono, 1_000_000);

#[app(device = embassy_stm32, peripherals = true, dispatchers = [USART1, USART2, USART3])]
mod app {
    use super::*;
    use defmt::{error, info, warn};
    use embassy_futures::join::join3;
    use embassy_stm32::exti::ExtiInput;
    use embassy_stm32::gpio::{Flex, Level, Output, Pull, Speed};
    use embassy_stm32::peripherals;
    use embassy_stm32::rcc::{Hse, HseMode, LsConfig, LseConfig, LseMode};
    use embassy_stm32::rtc::{Rtc, RtcConfig};
    use embassy_stm32::spi::{self, Spi};
    use embassy_stm32::time::Hertz;
    use hal_abstractions::{ButtonConfig, Edge, EventGroup, HostEvent, SensorModel, TimerMode};
    use iot_core::{App, AppConfig, Callback, SensorConfig};
    use rtic::Mutex;
    use rtic_sync::channel::Receiver;
    use static_cell::{ConstStaticCell, StaticCell};

    use dht::{Dht, DhtDriver};
    use network::mqtt::{TLS_READ_BUF_SIZE, TLS_WRITE_BUF_SIZE};
    use network::{
        MqttConfig, MqttSession, NetEventSender, NetworkConfig, QueuePublisher, SntpClient,
        SntpConfig, NET_EVENT_CAPACITY,
    };
    use runtime::{pins, BoardRuntime, TimerSlot};
    use system::BoardSystem;

    type Firmware = App<Output<'static>, Dht, QueuePublisher, BoardSystem>;

    type SpiPeripheral = embassy_stm32::Peri<'static, peripherals::SPI2>;
    type PinPB13 = embassy_stm32::Peri<'static, peripherals::PB13>;
    type PinPB15 = embassy_stm32::Peri<'static, peripherals::PB15>;
    type PinPB14 = embassy_stm32::Peri<'static, peripherals::PB14>;
    type PinPC6 = embassy_stm32::Peri<'static, peripherals::PC6>;
    type PinPC3 = embassy_stm32::Peri<'static, peripherals::PC3>;
    type PinPC2 = embassy_stm32::Peri<'static, peripherals::PC2>;
    type ExtiChannel = embassy_stm32::Peri<'static, peripherals::EXTI2>;
    type DmaTx = embassy_stm32::Peri<'static, peripherals::DMA1_CH4>;
    type DmaRx = embassy_stm32::Peri<'static, peripherals::DMA1_CH3>;

    struct NetworkPeripherals {
        spi: SpiPeripheral,
        sck: PinPB13,
        mosi: PinPB15,
        miso: PinPB14,
        cs: PinPC6,
        reset: PinPC3,
        int: PinPC2,
        exti: ExtiChannel,
        dma_tx: DmaTx,
        dma_rx: DmaRx,
    }

    // RNG interrupt binding for hardware random number generator
    embassy_stm32::bind_interrupts!(struct RngIrqs {
        RNG => embassy_stm32::rng::InterruptHandler<peripherals::RNG>;
    });

    #[shared]
    struct Shared {
        app: Firmware,
    }

    #[local]
    struct Local {}

    #[init]
    fn init(_cx: init::Context) -> (Shared, Local) {
        info!("Weather node starting...");

        // Adafruit Feather STM32F405: 12 MHz HSE, 32.768 kHz LSE (PC14/PC15)
        let mut config = embassy_stm32::Config::default();
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        // 12 MHz / 6 * 168 = 336 MHz VCO; /4 = 84 MHz SYSCLK, /7 = 48 MHz RNG
        config.rcc.pll_src = embassy_stm32::rcc::PllSource::HSE;
        config.rcc.pll = Some(embassy_stm32::rcc::Pll {
            prediv: embassy_stm32::rcc::PllPreDiv::DIV6,
            mul: embassy_stm32::rcc::PllMul::MUL168,
            divp: Some(embassy_stm32::rcc::PllPDiv::DIV4),
            divq: Some(embassy_stm32::rcc::PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = embassy_stm32::rcc::Sysclk::PLL1_P;
        config.rcc.ahb_pre = embassy_stm32::rcc::AHBPrescaler::DIV1; // 84 MHz
        config.rcc.apb1_pre = embassy_stm32::rcc::APBPrescaler::DIV2; // 42 MHz
        config.rcc.apb2_pre = embassy_stm32::rcc::APBPrescaler::DIV1; // 84 MHz

        config.rcc.ls = LsConfig {
            rtc: embassy_stm32::rcc::RtcClockSource::LSE,
            lsi: false,
            lse: Some(LseConfig {
                frequency: Hertz(32_768),
                mode: LseMode::Oscillator(embassy_stm32::rcc::LseDrive::MediumHigh),
            }),
        };

        let p = embassy_stm32::init(config);

        // TIM2 on APB1 runs at 2 * 42 MHz
        Mono::start(84_000_000);

        system::initialize_rtc(Rtc::new(p.RTC, RtcConfig::default()));

        let led = Output::new(p.PC1, Level::Low, Speed::Low);
        let mut driver = DhtDriver::new(Flex::new(p.PB8));
        let mut runtime = BoardRuntime::new();

        let app_config = AppConfig {
            led_pin: pins::LED,
            button: ButtonConfig {
                pin: pins::BUTTON,
                ..AppConfig::default().button
            },
            sensor: SensorConfig {
                pin: pins::DHT,
                model: SensorModel::Dht22,
            },
            ..AppConfig::default()
        };

        let firmware = match App::bootstrap(
            app_config,
            &mut runtime,
            &mut driver,
            led,
            QueuePublisher,
            BoardSystem::new(),
        ) {
            Ok(firmware) => firmware,
            Err(e) => defmt::panic!("Invalid configuration: {}", e),
        };

        let schedule = runtime.into_schedule();
        for (index, slot) in schedule.timers.iter().copied().enumerate() {
            let spawned = match index {
                0 => timer0::spawn(slot).is_ok(),
                _ => timer1::spawn(slot).is_ok(),
            };
            if !spawned {
                error!("Failed to start timer {}", index + 1);
            }
        }

        if let Some((config, callback)) = schedule.button {
            let pull = match config.pull {
                hal_abstractions::Pull::None => Pull::None,
                hal_abstractions::Pull::Up => Pull::Up,
                hal_abstractions::Pull::Down => Pull::Down,
            };
            let input = ExtiInput::new(p.PB9, p.EXTI9, pull);
            if button::spawn(input, config, callback).is_err() {
                error!("Failed to start button task");
            }
        }

        let (sender, receiver) = rtic_sync::make_channel!(i32, NET_EVENT_CAPACITY);
        if let Some(callback) = schedule.net {
            if net_events::spawn(callback, receiver).is_err() {
                error!("Failed to start network event task");
            }
        }

        let net_periph = NetworkPeripherals {
            spi: p.SPI2,
            sck: p.PB13,
            mosi: p.PB15,
            miso: p.PB14,
            cs: p.PC6,
            reset: p.PC3,
            int: p.PC2,
            exti: p.EXTI2,
            dma_tx: p.DMA1_CH4,
            dma_rx: p.DMA1_CH3,
        };
        if network_task::spawn(net_periph, p.RNG, sender).is_err() {
            error!("Failed to start network task");
        }

        (Shared { app: firmware }, Local {})
    }

    /// First registered timer
    #[task(priority = 1, shared = [app])]
    async fn timer0(cx: timer0::Context, slot: TimerSlot) {
        run_timer(cx.shared.app, slot).await;
    }

    /// Second registered timer
    #[task(priority = 1, shared = [app])]
    async fn timer1(cx: timer1::Context, slot: TimerSlot) {
        run_timer(cx.shared.app, slot).await;
    }

    async fn run_timer(mut app: impl Mutex<T = Firmware>, slot: TimerSlot) {
        let period = (slot.period_ms as u64).millis();
        loop {
            Mono::delay(period).await;
            app.lock(|app| app.dispatch(HostEvent::Timer(slot.callback)));
            if slot.mode == TimerMode::Once {
                break;
            }
        }
    }

    /// Button edges; edges within the debounce window of a handled one are
    /// ignored
    #[task(priority = 1, shared = [app])]
    async fn button(
        mut cx: button::Context,
        mut input: ExtiInput<'static>,
        config: ButtonConfig,
        callback: Callback,
    ) {
        let debounce = (config.debounce_ms as u64).millis();
        loop {
            match config.edge {
                Edge::Falling => input.wait_for_falling_edge().await,
                Edge::Rising => input.wait_for_rising_edge().await,
                Edge::Any => input.wait_for_any_edge().await,
            }
            cx.shared.app.lock(|app| {
                app.dispatch(HostEvent::Edge {
                    callback,
                    pin: config.pin,
                })
            });
            Mono::delay(debounce).await;
        }
    }

    /// Forward network events from the network task to the app
    #[task(priority = 1, shared = [app])]
    async fn net_events(
        mut cx: net_events::Context,
        callback: Callback,
        mut events: Receiver<'static, i32, NET_EVENT_CAPACITY>,
    ) {
        while let Ok(code) = events.recv().await {
            cx.shared.app.lock(|app| {
                app.dispatch(HostEvent::Event {
                    callback,
                    group: EventGroup::Net,
                    code,
                })
            });
        }
    }

    /// Network task - W5500, DHCP, SNTP and the MQTT session
    ///
    /// Stack is !Send and must remain within this task.
    #[task(priority = 1)]
    async fn network_task(
        _cx: network_task::Context,
        periph: NetworkPeripherals,
        rng_periph: embassy_stm32::Peri<'static, peripherals::RNG>,
        events: NetEventSender,
    ) {
        use embassy_net::{Config, StackResources};

        let mut spi_config = spi::Config::default();
        spi_config.frequency = Hertz(10_000_000); // 10 MHz for W5500

        let spi = Spi::new(
            periph.spi,
            periph.sck,
            periph.mosi,
            periph.miso,
            periph.dma_tx,
            periph.dma_rx,
            spi_config,
        );

        let eth_periph = eth::EthPeripherals {
            spi,
            cs: Output::new(periph.cs, Level::High, Speed::VeryHigh),
            reset: Output::new(periph.reset, Level::High, Speed::Low),
            int: ExtiInput::new(periph.int, periph.exti, Pull::Up),
        };

        let net_config = NetworkConfig::default();
        let (device, w5500_runner) = match eth::init_w5500(eth_periph, net_config.mac_addr).await {
            Ok(eth) => eth,
            Err(e) => {
                error!("Ethernet unavailable: {:?}", e);
                return;
            }
        };

        static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
        let (stack, mut net_runner) = embassy_net::new(
            device,
            Config::dhcpv4(Default::default()),
            RESOURCES.init(StackResources::new()),
            net_config.seed,
        );

        let clients = async {
            network::wait_for_config(&stack).await;
            run_clients(stack, rng_periph).await
        };

        join3(
            w5500_runner.run(),
            net_runner.run(),
            embassy_futures::join::join(network::watch_link(stack, events), clients),
        )
        .await;
    }

    async fn run_clients(
        stack: embassy_net::Stack<'static>,
        rng_periph: embassy_stm32::Peri<'static, peripherals::RNG>,
    ) {
        use embassy_stm32::rng::Rng;

        static TLS_READ: ConstStaticCell<[u8; TLS_READ_BUF_SIZE]> =
            ConstStaticCell::new([0; TLS_READ_BUF_SIZE]);
        static TLS_WRITE: ConstStaticCell<[u8; TLS_WRITE_BUF_SIZE]> =
            ConstStaticCell::new([0; TLS_WRITE_BUF_SIZE]);
        static CLIENT_ID: StaticCell<heapless::String<{ device_id::DEVICE_ID_MAX_LEN }>> =
            StaticCell::new();

        let sntp = SntpClient::new(SntpConfig::default());
        if let Err(e) = sntp.sync(stack).await {
            warn!("SNTP initialization failed: {:?}", e);
        }

        let client_id: &'static heapless::String<{ device_id::DEVICE_ID_MAX_LEN }> =
            CLIENT_ID.init(device_id::device_id());
        let mqtt_config = MqttConfig::default();
        let reconnect_delay = mqtt_config.reconnect_delay;
        let mut session = MqttSession::new(
            mqtt_config,
            client_id.as_str(),
            TLS_READ.take(),
            TLS_WRITE.take(),
        );
        let mut rng = Rng::new(rng_periph, RngIrqs);

        let resync = async {
            loop {
                embassy_time::Timer::after(sntp.resync_interval()).await;
                if let Err(e) = sntp.sync(stack).await {
                    warn!("SNTP resync failed: {:?}", e);
                }
            }
        };

        let mqtt = async {
            loop {
                if let Err(e) = session.run(stack, &mut rng).await {
                    warn!("MQTT session ended: {:?}", e);
                }
                embassy_time::Timer::after(reconnect_delay).await;
            }
        };

        embassy_futures::join::join(resync, mqtt).await;
    }

    /// RTIC idle task - WFI sleep mode when no tasks active
    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }
}
