use serde::Deserialize;

/// Processed NF-e wrapper (`<nfeProc>`), the shape most authorized invoice files use
#[derive(Debug, Deserialize)]
pub struct NfeProc {
    #[serde(rename = "NFe", default)]
    pub nfe: Nfe,
}

#[derive(Debug, Default, Deserialize)]
pub struct Nfe {
    #[serde(rename = "infNFe", default)]
    pub inf_nfe: InfNfe,
}

#[derive(Debug, Default, Deserialize)]
pub struct InfNfe {
    /// `NFe` followed by the 44-digit access key
    #[serde(rename = "@Id", default)]
    pub id: String,
    #[serde(rename = "det", default)]
    pub det: Vec<Det>,
}

#[derive(Debug, Deserialize)]
pub struct Det {
    #[serde(rename = "@nItem", default)]
    pub n_item: String,
    #[serde(default)]
    pub prod: Prod,
}

#[derive(Debug, Default, Deserialize)]
pub struct Prod {
    #[serde(rename = "cProd", default)]
    pub c_prod: String,
    #[serde(rename = "cEAN", default)]
    pub c_ean: String,
    #[serde(rename = "xProd", default)]
    pub x_prod: String,
    #[serde(rename = "qCom", default)]
    pub q_com: String,
}
