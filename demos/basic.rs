use resilient_http::{
    Authentication, CancellationToken, HttpExecutor, RequestSpec, RetryPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let endpoint = std::env::var("RESILIENT_HTTP_ENDPOINT")?;

    let executor = HttpExecutor::new();
    let mut request = RequestSpec::get(endpoint).with_retry(RetryPolicy {
        max_attempts: 3,
        delay_multiplier_secs: 2,
    });
    if let Ok(token) = std::env::var("RESILIENT_HTTP_TOKEN") {
        request = request.with_authentication(Authentication::Bearer(token));
    }

    let envelope = executor.execute(&request, &CancellationToken::new()).await?;
    if envelope.is_success {
        println!("{}", envelope.data);
    } else {
        eprintln!(
            "{} {}: {:?}",
            envelope.status_code, envelope.status_description, envelope.errors
        );
    }

    Ok(())
}
