mod common;

use common::TestApp;
use order_service::services::Store;
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

fn image(name: &str) -> Part {
    Part::bytes(b"png-bytes".to_vec())
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}

#[tokio::test]
async fn category_crud_round() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let created = app
        .client
        .post(app.url("/api/admin/kategori"))
        .bearer_auth(&token)
        .json(&json!({ "nama_kategori": "Minuman" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let id = created.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let renamed: Value = app
        .client
        .put(app.url(&format!("/api/admin/kategori/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "nama_kategori": "Minuman Dingin" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(renamed["nama_kategori"], "Minuman Dingin");

    let listed: Value = app
        .client
        .get(app.url("/api/public/kategori"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let deleted = app
        .client
        .delete(app.url(&format!("/api/admin/kategori/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);
    assert_eq!(
        deleted.json::<Value>().await.unwrap()["message"],
        "Data berhasil dihapus"
    );
}

#[tokio::test]
async fn blank_category_name_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/admin/kategori"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "nama_kategori": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/kategori/{}", catalog.category_id)))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("menu item"));
    assert_eq!(app.store.list_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn menu_item_lifecycle() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let token = app.admin_token();

    let form = Form::new()
        .text("nama_produk", "Es Teh")
        .text("deskripsi", "Manis")
        .text("harga", "5000")
        .text("kategori_id", catalog.category_id.to_string())
        .part("gambar", image("es teh.png"));
    let created = app
        .client
        .post(app.url("/api/admin/menu"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let product: Value = created.json().await.unwrap();
    let id = product["id"].as_i64().unwrap();
    assert!(product["gambar_url"]
        .as_str()
        .unwrap()
        .contains("/files/uploads/"));

    let form = Form::new()
        .text("nama_produk", "Es Teh Manis")
        .text("harga", "6000")
        .text("kategori_id", catalog.category_id.to_string());
    let updated: Value = app
        .client
        .put(app.url(&format!("/api/admin/menu/{}", id)))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["nama_produk"], "Es Teh Manis");
    assert_eq!(updated["gambar_url"], product["gambar_url"]);

    let public: Value = app
        .client
        .get(app.url(&format!("/api/public/menu/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public["harga"].as_f64(), Some(6000.0));

    let deleted = app
        .client
        .delete(app.url(&format!("/api/admin/menu/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let missing = app
        .client
        .get(app.url(&format!("/api/public/menu/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn menu_item_requires_an_image() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;

    let form = Form::new()
        .text("nama_produk", "Es Jeruk")
        .text("harga", "7000")
        .text("kategori_id", catalog.category_id.to_string());
    let response = app
        .client
        .post(app.url("/api/admin/menu"))
        .bearer_auth(app.admin_token())
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn payment_methods_can_be_managed() {
    let app = TestApp::spawn().await;
    let token = app.admin_token();

    let created = app
        .client
        .post(app.url("/api/admin/metode-pembayaran"))
        .bearer_auth(&token)
        .json(&json!({ "nama_metode": "QRIS", "is_active": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let id = created.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let form = Form::new()
        .text("nama_metode", "QRIS Toko")
        .text("nomor_rekening", "1234567890")
        .text("nama_rekening", "Warung Sederhana")
        .part("gambar_qris", image("qris.png"));
    let updated: Value = app
        .client
        .put(app.url(&format!("/api/admin/metode-pembayaran/{}", id)))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["nama_metode"], "QRIS Toko");
    assert!(updated["gambar_qris_url"]
        .as_str()
        .unwrap()
        .contains(&format!("/qris-images/qris_{}_", id)));

    let listed = app
        .client
        .get(app.url("/api/public/metode-pembayaran"))
        .send()
        .await
        .unwrap();
    assert!(listed.headers().contains_key("cache-control"));
    let methods: Value = listed.json().await.unwrap();
    assert_eq!(methods.as_array().unwrap().len(), 1);

    let deleted = app
        .client
        .delete(app.url(&format!("/api/admin/metode-pembayaran/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);
}

#[tokio::test]
async fn dashboard_reports_todays_figures() {
    let app = TestApp::spawn().await;
    let catalog = app.seed_catalog().await;
    let token = app.admin_token();

    app.post_order(json!({
        "cartItems": [{ "id": catalog.product_id, "harga": 10000, "jumlah": 2 }],
        "total_harga": 20000,
        "tipe_pesanan": "OFFLINE",
        "metode_pembayaran_id": catalog.cash_method_id
    }))
    .await;
    app.place_online_order(&catalog, None).await;

    let stats: Value = app
        .client
        .get(app.url("/api/admin/dashboard/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["pendapatanHariIni"].as_f64(), Some(20000.0));
    assert_eq!(stats["jumlahPesananBaru"], 1);
    assert_eq!(stats["menuTerlaris"], "Nasi Goreng");

    let chart: Value = app
        .client
        .get(app.url("/api/admin/dashboard/sales-chart"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let points = chart.as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert_eq!(points[6]["total"].as_f64(), Some(20000.0));
}
