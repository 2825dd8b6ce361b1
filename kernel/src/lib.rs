#![cfg_attr(target_os = "none", no_std)] // host builds keep std for the test harness

pub mod arch;
pub mod cpu;
pub mod earth;
pub mod layout;
pub mod logger;
pub mod process;
pub mod symbols;
pub mod trap;

/// Bring the process core up. Called once on the boot core, before any
/// process is allocated and before the first trap can be taken.
pub fn init(earth: &'static (dyn earth::Earth + Sync)) {
    earth::install(earth);
    logger::init();
    log::info!(
        "process core up: {} cores, {} process slots, {} MLFQ levels",
        symbols::NCPUS,
        symbols::MAX_NPROCESS,
        symbols::MLFQ_NLEVELS
    );
}

/// Panic handler
#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    let core = arch::hart_id();
    match info.location() {
        Some(p) => panic_println!(
            "core {} aborting: line {}, file {}: {}",
            core,
            p.line(),
            p.file(),
            info.message()
        ),
        None => panic_println!("core {} aborting: {}", core, info.message()),
    }
    abort();
}

/// Abort function
#[cfg(target_os = "none")]
#[no_mangle]
extern "C" fn abort() -> ! {
    arch::wait_forever()
}
