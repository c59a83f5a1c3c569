//! End-to-end upload/download tests.

#[cfg(test)]
mod tests {
    use crate::{client, object_url};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_uploaded_bytes() {
        let client = client();
        let url = object_url("roundtrip");

        let resp = client
            .post(&url)
            .body("1 2 3")
            .send()
            .await
            .expect("post");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "OK");

        let resp = client.get(&url).send().await.expect("get");
        assert_eq!(resp.status(), 200);
        assert!(resp.headers().contains_key("last-modified"));
        assert_eq!(resp.text().await.expect("body"), "1 2 3");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_not_found_for_missing_key() {
        let client = client();
        let url = object_url("missing");

        let resp = client.get(&url).send().await.expect("get");
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_overwrite_object_on_repeated_post() {
        let client = client();
        let url = object_url("overwrite");

        let resp = client.post(&url).body("first").send().await.expect("post");
        assert_eq!(resp.status(), 200);
        let resp = client.post(&url).body("second").send().await.expect("post");
        assert_eq!(resp.status(), 200);

        let resp = client.get(&url).send().await.expect("get");
        assert_eq!(resp.text().await.expect("body"), "second");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unknown_method() {
        let client = client();
        let url = object_url("method");

        let resp = client.put(&url).body("data").send().await.expect("put");
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.text().await.expect("body"), "Unknown method");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_missing_key() {
        let client = client();
        let url = format!(
            "{}/",
            std::env::var("STASHD_ENDPOINT_URL")
                .unwrap_or_else(|_| "http://localhost:9292".to_owned())
        );

        let resp = client.post(&url).body("data").send().await.expect("post");
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.text().await.expect("body"), "Missing object key");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_range_request() {
        let client = client();
        let url = object_url("range");

        client
            .post(&url)
            .body("0123456789")
            .send()
            .await
            .expect("post");

        let resp = client
            .get(&url)
            .header("range", "bytes=2-5")
            .send()
            .await
            .expect("get");
        assert_eq!(resp.status(), 206);
        assert_eq!(
            resp.headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok()),
            Some("bytes 2-5/10"),
        );
        assert_eq!(resp.text().await.expect("body"), "2345");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_not_modified_for_fresh_copy() {
        let client = client();
        let url = object_url("conditional");

        client.post(&url).body("cached").send().await.expect("post");

        let resp = client.get(&url).send().await.expect("get");
        let last_modified = resp
            .headers()
            .get("last-modified")
            .and_then(|v| v.to_str().ok())
            .expect("last-modified header")
            .to_owned();

        let resp = client
            .get(&url)
            .header("if-modified-since", last_modified)
            .send()
            .await
            .expect("get");
        assert_eq!(resp.status(), 304);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_tag_responses_with_request_id() {
        let client = client();
        let url = object_url("reqid");

        let resp = client.get(&url).send().await.expect("get");
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(
            resp.headers().get("server").and_then(|v| v.to_str().ok()),
            Some("Stashd"),
        );
    }
}
