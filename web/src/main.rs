fn main() {
    localchat_web::mount();
}
