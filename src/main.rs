#![cfg_attr(target_os = "uefi", no_std)]
#![cfg_attr(target_os = "uefi", no_main)]

#[cfg(target_os = "uefi")]
mod efi {
    use core::panic::PanicInfo;

    use uefi::{Handle, Status};

    use vicebios::exit::EscapeMailbox;
    use vicebios::firmware::boot::FirmwareBootManager;
    use vicebios::firmware::clock::RuntimeClock;
    use vicebios::firmware::info::FirmwareInfo;
    use vicebios::firmware::{self, FirmwarePool, StallTicks, UefiPlatform};
    use vicebios::memory::PoolAllocator;
    use vicebios::views::SetupApp;
    use vicebios::{Config, Session};

    #[global_allocator]
    static ALLOCATOR: PoolAllocator<FirmwarePool> = PoolAllocator::new(FirmwarePool);

    static ESCAPE_MAILBOX: EscapeMailbox = EscapeMailbox::new();

    #[no_mangle]
    pub extern "efiapi" fn efi_main(
        handle: Handle,
        system_table: *const uefi_raw::table::system::SystemTable,
    ) -> Status {
        unsafe {
            uefi::boot::set_image_handle(handle);
            uefi::table::set_system_table(system_table);
        }
        if uefi::helpers::init().is_err() {
            return Status::SUCCESS;
        }

        let options = firmware::load_options().unwrap_or_default();
        let config = Config::from_options(&options);
        log::set_max_level(config.log_level);
        log::info!("ViceBIOS setup starting");

        let mut app = SetupApp::new(
            FirmwareInfo,
            RuntimeClock,
            FirmwareBootManager,
            config.clock_refresh_ms,
        );
        let mut session = Session::new(UefiPlatform::default(), StallTicks, config, &ESCAPE_MAILBOX);
        if let Err(e) = session.run(&mut app) {
            log::error!("setup utility stopped: {}", e);
        }
        Status::SUCCESS
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        log::error!("{}", info);
        loop {
            core::hint::spin_loop();
        }
    }
}

#[cfg(not(target_os = "uefi"))]
fn main() {
    eprintln!("vicebios runs as a UEFI application; build it for a *-unknown-uefi target");
}
