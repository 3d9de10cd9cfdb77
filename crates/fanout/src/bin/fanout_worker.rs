use fanout_worker::{ExitStatus, fanout_worker_main};

fn main() -> ExitStatus {
    fanout_worker_main(|args| args)
}
