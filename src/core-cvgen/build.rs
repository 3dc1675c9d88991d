fn main() {
    // Declare the custom cfgs so rustc knows about them
    println!("cargo::rustc-check-cfg=cfg(has_openai_key)");
    println!("cargo::rustc-check-cfg=cfg(has_firecrawl_key)");

    // Live API tests only compile when their credentials are present at build time.
    for (var, cfg) in [("OPENAI_API_KEY", "has_openai_key"), ("FIRECRAWL_API_KEY", "has_firecrawl_key")] {
        println!("cargo::rerun-if-env-changed={var}");
        if let Ok(value) = std::env::var(var)
            && !value.trim().is_empty()
        {
            println!("cargo::rustc-cfg={cfg}");
        }
    }
}
