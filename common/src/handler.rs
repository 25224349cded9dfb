//! [`Handler`] abstractions.

use std::future::Future;

/// Asynchronous handler of some `Args`.
///
/// Every seam of the application is expressed through it: use-cases are
/// handled by a service, while storing, uploading and notifying are handled
/// by its infrastructure. Which `Args` are supported is declared via trait
/// bounds, so infrastructure is swappable per operation.
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes this [`Handler`] with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

#[cfg(test)]
mod spec {
    use std::{
        future::Future,
        pin::pin,
        sync::Arc,
        task::{Context, Poll, Wake},
    };

    use super::Handler;

    struct Doubler;

    impl Handler<u8> for Doubler {
        type Ok = u16;
        type Err = ();

        async fn execute(&self, n: u8) -> Result<u16, ()> {
            Ok(u16::from(n) * 2)
        }
    }

    struct Noop;

    impl Wake for Noop {
        fn wake(self: Arc<Self>) {}
    }

    #[test]
    fn executes_with_args() {
        let waker = Arc::new(Noop).into();
        let mut cx = Context::from_waker(&waker);

        let fut = pin!(Doubler.execute(21));
        assert_eq!(fut.poll(&mut cx), Poll::Ready(Ok(42)));
    }
}
