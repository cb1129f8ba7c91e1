use listening_party::services::documentation::ApiDoc;

fn main() -> Result<(), serde_json::Error> {
    let doc = ApiDoc::document();
    println!("{}", doc.to_pretty_json()?);
    Ok(())
}
