/// Sink for errors the user has to see.
pub trait Notifier {
    fn report_error(&self, message: &str);
}

/// Non-blocking notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn report_error(&self, message: &str) {
        log::error!("[Notify] {message}");
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_log_notifier_is_a_notifier() {
        let _ = env_logger::builder().is_test(true).try_init();
        let notifier: Rc<dyn Notifier> = Rc::new(LogNotifier);
        notifier.report_error("Deletion failed: HTTP 500: boom");
    }
}
