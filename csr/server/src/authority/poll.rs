use std::ops::ControlFlow;
use std::time::Duration;

/// Calls `f` until it breaks, sleeping before each attempt.
///
/// The delay doubles after every attempt. Returns the last state if `f` did
/// not break after `tries` attempts.
pub(super) async fn poll<S, FR, R>(
    mut f: impl FnMut(S) -> FR,
    mut state: S,
    mut tries: i32,
    mut delay: Duration,
) -> Result<R, S>
where
    FR: Future<Output = ControlFlow<R, S>>,
{
    while tries > 0 {
        tokio::time::sleep(delay).await;
        match f(state).await {
            ControlFlow::Continue(new_state) => state = new_state,
            ControlFlow::Break(result) => return Ok(result),
        }
        delay *= 2;
        tries -= 1;
    }
    return Err(state);
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;
    use std::time::Duration;

    use super::poll;

    #[tokio::test]
    async fn breaks() {
        let result = poll(
            |attempt: i32| async move {
                if attempt == 3 {
                    ControlFlow::Break("issued")
                } else {
                    ControlFlow::Continue(attempt + 1)
                }
            },
            1,
            5,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(Ok("issued"), result);
    }

    #[tokio::test]
    async fn gives_up() {
        let result: Result<(), i32> = poll(
            |attempt: i32| async move { ControlFlow::Continue(attempt + 1) },
            0,
            4,
            Duration::from_millis(1),
        )
        .await;
        assert_eq!(Err(4), result);
    }

    #[tokio::test]
    async fn no_tries() {
        let result: Result<(), &str> = poll(
            |state| async move { ControlFlow::Continue(state) },
            "never polled",
            0,
            Duration::from_secs(3600),
        )
        .await;
        assert_eq!(Err("never polled"), result);
    }
}
